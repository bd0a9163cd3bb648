use std::fmt;

/// One pending query: the values of a single queue line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRow {
    values: Vec<String>,
}

impl QueryRow {
    /// Parses one comma-separated line. Quoted fields follow CSV rules;
    /// values are trimmed.
    pub fn parse(line: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let values: Vec<String> = match reader.records().next() {
            Some(Ok(record)) => record.iter().map(|v| v.trim().to_string()).collect(),
            _ => line.split(',').map(|v| v.trim().to_string()).collect(),
        };
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for QueryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values.join(","))
    }
}

/// Ordered queue of pending query lines, stored as a single text blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryQueue {
    lines: Vec<String>,
}

impl QueryQueue {
    /// Builds a queue from persisted text. Blank lines are not rows.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self { lines }
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn pop_front(&mut self) -> Option<QueryRow> {
        if self.lines.is_empty() {
            return None;
        }
        let line = self.lines.remove(0);
        Some(QueryRow::parse(&line))
    }
}
