use crate::view_model::SessionView;
use crate::{QueryQueue, ResultAccumulator};

/// Everything the runner knows on a page load, rebuilt from the store each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// `None` until a query file has been uploaded.
    pub queue: Option<QueryQueue>,
    pub results: ResultAccumulator,
    pub autoclick: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            queue: None,
            results: ResultAccumulator::default(),
            autoclick: true,
        }
    }
}

impl SessionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.queue.as_ref().map_or(0, QueryQueue::len)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            uploaded: self.queue.is_some(),
            remaining_queries: self.remaining(),
            scraped_rows: self.results.row_count(),
            header: self.results.header().map(ToOwned::to_owned),
            autoclick: self.autoclick,
        }
    }
}
