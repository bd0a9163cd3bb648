use relay_core::strip_quotes;
use scraper::{Html, Selector};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("invalid selector {0}")]
    InvalidSelector(String),
    #[error("no table matches {0:?}")]
    TableNotFound(String),
    #[error("table {0:?} has no rows")]
    EmptyTable(String),
    #[error("csv error: {0}")]
    Csv(String),
}

/// Converts the table matched by `table_selector` into CSV text.
///
/// The first row becomes the header line. Cell text has its whitespace
/// collapsed and every `"` removed.
pub fn scrape_table(html: &str, table_selector: &str) -> Result<String, ScrapeError> {
    let doc = Html::parse_document(html);
    let table_sel = parse_selector(table_selector)?;
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("th, td")?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::TableNotFound(table_selector.to_string()))?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    let mut row_count = 0usize;
    for row in table.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| clean_cell(&cell.text().collect::<String>()))
            .collect();
        if cells.is_empty() {
            continue;
        }
        writer
            .write_record(&cells)
            .map_err(|err| ScrapeError::Csv(err.to_string()))?;
        row_count += 1;
    }
    if row_count == 0 {
        return Err(ScrapeError::EmptyTable(table_selector.to_string()));
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ScrapeError::Csv(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ScrapeError::Csv(err.to_string()))
}

fn parse_selector(raw: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(raw).map_err(|err| ScrapeError::InvalidSelector(format!("{raw}: {err:?}")))
}

fn clean_cell(text: &str) -> String {
    strip_quotes(&text.split_whitespace().collect::<Vec<_>>().join(" "))
}
