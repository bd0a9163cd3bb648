use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use relay_core::{QueryQueue, ResultAccumulator, SessionSnapshot};
use relay_logging::relay_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

pub const STATE_FILENAME: &str = ".relay_state.ron";
pub const AUTOCLICK_KEY: &str = "autoclick";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path:?} is unreadable: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("failed to serialize state: {0}")]
    Serialize(String),
    #[error("key {key:?} does not hold a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("state store lock poisoned")]
    Poisoned,
}

/// Key-value storage that outlives a single page load.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    async fn del(&self, key: &str) -> Result<(), StoreError>;
}

/// Per-source key names of the query queue and the result accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub queries: String,
    pub results: String,
}

impl StoreKeys {
    pub fn for_source(source: &str) -> Self {
        Self {
            queries: format!("{source}_queries"),
            results: format!("{source}_results"),
        }
    }
}

/// Rebuilds the session snapshot from the store.
pub async fn load_snapshot(
    store: &dyn KeyValueStore,
    keys: &StoreKeys,
) -> Result<SessionSnapshot, StoreError> {
    let queue = get_text(store, &keys.queries)
        .await?
        .map(|text| QueryQueue::from_text(&text));
    let results = get_text(store, &keys.results)
        .await?
        .map(ResultAccumulator::from_text)
        .unwrap_or_default();
    let autoclick = match store.get(AUTOCLICK_KEY).await? {
        None => true,
        Some(StoredValue::Flag(flag)) => flag,
        Some(StoredValue::Text(_)) => {
            return Err(StoreError::TypeMismatch {
                key: AUTOCLICK_KEY.to_string(),
                expected: "flag",
            })
        }
    };
    Ok(SessionSnapshot {
        queue,
        results,
        autoclick,
    })
}

pub async fn save_snapshot(
    store: &dyn KeyValueStore,
    keys: &StoreKeys,
    snapshot: &SessionSnapshot,
) -> Result<(), StoreError> {
    match &snapshot.queue {
        Some(queue) => {
            store
                .set(&keys.queries, StoredValue::Text(queue.to_text()))
                .await?
        }
        None => store.del(&keys.queries).await?,
    }
    store
        .set(
            &keys.results,
            StoredValue::Text(snapshot.results.as_str().to_string()),
        )
        .await?;
    store
        .set(AUTOCLICK_KEY, StoredValue::Flag(snapshot.autoclick))
        .await
}

/// Deletes the queue, the accumulator and the autoclick flag.
pub async fn clear_session(store: &dyn KeyValueStore, keys: &StoreKeys) -> Result<(), StoreError> {
    store.del(&keys.queries).await?;
    store.del(&keys.results).await?;
    store.del(AUTOCLICK_KEY).await
}

async fn get_text(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>, StoreError> {
    match store.get(key).await? {
        None => Ok(None),
        Some(StoredValue::Text(text)) => Ok(Some(text)),
        Some(StoredValue::Flag(_)) => Err(StoreError::TypeMismatch {
            key: key.to_string(),
            expected: "text",
        }),
    }
}

/// Store backed by a single RON file in `dir`.
///
/// Every operation re-reads the file, so separate processes see each other's
/// writes. Two processes writing concurrently can still lose an update; only
/// one session per state directory is supported.
pub struct FileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILENAME)
    }

    fn read_map(&self) -> Result<BTreeMap<String, StoredValue>, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(corrupt(&path, err.to_string())),
        };
        ron::from_str(&content).map_err(|err| corrupt(&path, err.to_string()))
    }

    fn write_map(&self, map: &BTreeMap<String, StoredValue>) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(map, pretty)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        AtomicFileWriter::new(&self.dir).write(STATE_FILENAME, content)?;
        Ok(())
    }

    fn modify(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, StoredValue>),
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut map = self.read_map()?;
        change(&mut map);
        self.write_map(&map)
    }
}

fn corrupt(path: &Path, message: String) -> StoreError {
    StoreError::Corrupt {
        path: path.to_path_buf(),
        message,
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_map()?.remove(key))
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        relay_debug!("store set {}", key);
        self.modify(|map| {
            map.insert(key.to_string(), value);
        })
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        relay_debug!("store del {}", key);
        self.modify(|map| {
            map.remove(key);
        })
    }
}

/// In-process store; state is lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let map = self.map.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        let mut map = self.map.lock().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.map.lock().map_err(|_| StoreError::Poisoned)?;
        map.remove(key);
        Ok(())
    }
}
