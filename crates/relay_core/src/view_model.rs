/// Read-only summary of a persisted session, used for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub uploaded: bool,
    pub remaining_queries: usize,
    pub scraped_rows: usize,
    pub header: Option<String>,
    pub autoclick: bool,
}
