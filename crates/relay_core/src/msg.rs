use crate::QueryQueue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A reshaped query file was uploaded.
    QueriesUploaded { queue: QueryQueue },
    /// The current page is the input form.
    InputPageLoaded,
    /// The current page is a result page; `scraped` is its CSV with header.
    ResultPageLoaded { scraped: String },
    /// User toggled the autoclick flag.
    AutoclickChanged(bool),
}
