/// Growing CSV text of every scraped result page.
///
/// The first appended chunk keeps its header line; every later chunk has its
/// first line dropped, so the header appears exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultAccumulator {
    text: String,
}

impl ResultAccumulator {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn header(&self) -> Option<&str> {
        self.text.lines().next()
    }

    /// Data rows, not counting the header.
    pub fn row_count(&self) -> usize {
        self.text.lines().skip(1).filter(|l| !l.trim().is_empty()).count()
    }

    pub fn append(&mut self, chunk: &str) {
        let mut lines = chunk
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty());
        if !self.text.is_empty() {
            lines.next();
        }
        for line in lines {
            self.push_line(line);
        }
    }

    fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }
}
