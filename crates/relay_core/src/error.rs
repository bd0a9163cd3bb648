use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no query file found")]
    NoQueryFile,
    #[error("query queue is empty but the session is still running")]
    QueueExhausted,
    #[error("unknown page path: {path}")]
    UnknownPage { path: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReshapeError {
    #[error("column {0:?} not found in header")]
    MissingColumn(String),
    #[error("csv error: {0}")]
    Csv(String),
}

impl From<csv::Error> for ReshapeError {
    fn from(err: csv::Error) -> Self {
        ReshapeError::Csv(err.to_string())
    }
}
