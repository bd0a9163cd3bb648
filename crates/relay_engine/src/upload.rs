use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use relay_core::{
    reshape_upload, update, ColumnProjection, Effect, Msg, QueryQueue, ReshapeError, SessionError,
};
use relay_logging::relay_info;
use thiserror::Error;

use crate::store::{load_snapshot, save_snapshot, KeyValueStore, StoreError, StoreKeys};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read query file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("query file {path:?} has no queries after reshaping")]
    Empty { path: PathBuf },
    #[error(transparent)]
    Reshape(#[from] ReshapeError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub rows: usize,
    /// Effects left for the caller, normally a navigation to the start page.
    pub effects: Vec<Effect>,
}

/// Reads a query file, reshapes it and stores it as a fresh queue with an
/// empty result slot.
pub async fn upload_queries(
    store: &dyn KeyValueStore,
    keys: &StoreKeys,
    path: &Path,
    projection: Option<&ColumnProjection>,
    autoclick: bool,
) -> Result<UploadSummary, UploadError> {
    let text = fs::read_to_string(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reshaped = reshape_upload(&text, projection)?;
    let queue = QueryQueue::from_text(&reshaped);
    let rows = queue.len();
    if rows == 0 {
        return Err(UploadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let snapshot = load_snapshot(store, keys).await?;
    let (snapshot, _) = update(snapshot, Msg::AutoclickChanged(autoclick))?;
    let (snapshot, effects) = update(snapshot, Msg::QueriesUploaded { queue })?;
    save_snapshot(store, keys, &snapshot).await?;

    relay_info!("Uploaded {} queries from {:?} into {}", rows, path, keys.queries);
    Ok(UploadSummary { rows, effects })
}
