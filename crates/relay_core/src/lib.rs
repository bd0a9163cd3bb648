//! Relay core: pure session state machine, query reshaping and CSV helpers.
mod accumulator;
mod effect;
mod error;
mod msg;
mod page;
mod queue;
mod reshape;
mod state;
mod update;
mod view_model;

pub use accumulator::ResultAccumulator;
pub use effect::Effect;
pub use error::{ReshapeError, SessionError};
pub use msg::Msg;
pub use page::{classify_path, PagePaths, PageRole};
pub use queue::{QueryQueue, QueryRow};
pub use reshape::{reshape_upload, strip_quotes, ColumnProjection, DEFAULT_EXCLUDED_STATUS};
pub use state::SessionSnapshot;
pub use update::update;
pub use view_model::SessionView;
