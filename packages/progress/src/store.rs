use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::record::ProgressRecord;

pub const PROGRESS_KEY: &str = "bootcamp-progress";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Notification that a key was written or removed. Carries the key and the
/// store handle that caused it, never the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    pub key: String,
    pub origin: Uuid,
}

/// Origin-scoped key/value storage, modelled on browser local storage.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str, origin: Uuid) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str, origin: Uuid) -> Result<(), StoreError>;
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

fn notify(sender: &broadcast::Sender<StorageChange>, key: &str, origin: Uuid) {
    let change = StorageChange {
        key: key.to_string(),
        origin,
    };
    if sender.send(change).is_err() {
        debug!(key, "No storage change listeners");
    }
}

struct MemoryInner {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
    changes: broadcast::Sender<StorageChange>,
}

/// In-memory storage. Clones share the same map, so each clone behaves like
/// another tab of the same origin.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_quota(quota: usize) -> Self {
        Self::build(Some(quota))
    }

    fn build(quota: Option<usize>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                items: RwLock::new(HashMap::new()),
                quota,
                changes,
            }),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str, origin: Uuid) -> Result<(), StoreError> {
        {
            let mut items = self.inner.items.write();
            if let Some(quota) = self.inner.quota {
                let others: usize = items
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                let needed = others + key.len() + value.len();
                if needed > quota {
                    return Err(StoreError::QuotaExceeded { needed, quota });
                }
            }
            items.insert(key.to_string(), value.to_string());
        }
        notify(&self.inner.changes, key, origin);
        Ok(())
    }

    fn remove_item(&self, key: &str, origin: Uuid) -> Result<(), StoreError> {
        let removed = self.inner.items.write().remove(key).is_some();
        if removed {
            notify(&self.inner.changes, key, origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}

/// One JSON file per key inside a directory. Writes go to a temporary file
/// first and are renamed into place.
///
/// Change notifications reach every handle cloned from the same
/// `FileStorage`; separate processes do not see each other's writes until
/// their next load.
#[derive(Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            dir,
            quota,
            changes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// One file per key. Bytes outside `[A-Za-z0-9-]` become `_XX`, so
    /// distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(byte as char);
            } else {
                file_name.push_str(&format!("_{byte:02X}"));
            }
        }
        self.dir.join(format!("{file_name}.json"))
    }

    fn used_bytes_excluding(&self, skip: &Path) -> Result<usize, StoreError> {
        let mut total = 0usize;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            total += entry.metadata()?.len() as usize;
        }
        Ok(total)
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str, origin: Uuid) -> Result<(), StoreError> {
        let path = self.path_for(key);

        if let Some(quota) = self.quota {
            let needed = self.used_bytes_excluding(&path)? + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;

        notify(&self.changes, key, origin);
        Ok(())
    }

    fn remove_item(&self, key: &str, origin: Uuid) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                notify(&self.changes, key, origin);
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Owns the canonical [`ProgressRecord`] for one execution context.
///
/// Every mutation is a full read-modify-write of the blob; two stores over the
/// same backend race with last-writer-wins.
pub struct ProgressStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
    context: Uuid,
    clock: Arc<dyn Clock>,
}

impl ProgressStore {
    pub fn new(backend: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self::with_key(backend, clock, PROGRESS_KEY)
    }

    pub fn with_key(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            context: Uuid::new_v4(),
            clock,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Identifies this handle in [`StorageChange::origin`].
    pub fn context_id(&self) -> Uuid {
        self.context
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the stored record, creating and persisting a fresh one when
    /// nothing is stored or the stored blob cannot be parsed.
    pub fn load(&self) -> Result<ProgressRecord, StoreError> {
        if let Some(raw) = self.backend.get_item(&self.key)? {
            match serde_json::from_str::<ProgressRecord>(&raw) {
                Ok(record) => return Ok(record),
                Err(err) => {
                    warn!(key = %self.key, error = %err, "corrupt progress data, starting fresh");
                }
            }
        }

        let record = ProgressRecord::new(self.clock.now_millis());
        self.save(&record)?;
        Ok(record)
    }

    pub fn save(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.backend.set_item(&self.key, &raw, self.context)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove_item(&self.key, self.context)
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<StorageChange> {
        self.backend.subscribe()
    }

    /// A second handle on the same backend, as another tab would have.
    pub fn sibling(&self) -> Self {
        Self::with_key(Arc::clone(&self.backend), Arc::clone(&self.clock), self.key.clone())
    }
}
