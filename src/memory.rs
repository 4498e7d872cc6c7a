//! Bounded, append-only interaction memory.
//!
//! Typed records persisted as a single JSON document
//! (`{"memories": [...]}`). Every mutating call is a read-modify-write under
//! a scoped exclusive file lock, finished with an atomic replace, so the file
//! stays valid JSON and concurrent writers cannot lose updates. The store
//! keeps at most `max_items` records, evicting the oldest on overflow.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// One successfully ingested file.
    DocumentProcessing,
    /// One completed generation request.
    RppGeneration,
    /// Operator feedback on a generated RPP.
    Feedback,
}

/// One logged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub content: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// ISO-8601 creation timestamp.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Fields merged in via `update` that are not part of the fixed shape.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryFile {
    memories: Vec<MemoryRecord>,
}

/// Bounded JSON-persisted memory store.
pub struct MemoryStore {
    path: PathBuf,
    lock_path: PathBuf,
    max_items: usize,
}

/// Scoped exclusive lock on the memory file, released on drop.
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::Lock(format!("Failed to open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::Lock(format!("Failed to lock memory store: {}", e)))?;

        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl MemoryStore {
    /// Open the store, creating the file with an empty record list if absent.
    pub fn open(path: impl Into<PathBuf>, max_items: usize) -> Result<Self> {
        if max_items == 0 {
            return Err(Error::InvalidConfig(
                "max_memory_items must be > 0".to_string(),
            ));
        }

        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("lock");
        let store = Self {
            path,
            lock_path,
            max_items,
        };

        if !store.path.exists() {
            let _lock = StoreLock::acquire(&store.lock_path)?;
            store.save(&MemoryFile::default())?;
            info!("Initialized memory store at {}", store.path.display());
        }

        Ok(store)
    }

    /// Append a record with the current timestamp, then truncate from the
    /// front if the bound is exceeded. Returns the new record's id.
    pub fn add(
        &self,
        kind: MemoryKind,
        content: serde_json::Map<String, serde_json::Value>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String> {
        let _lock = StoreLock::acquire(&self.lock_path)?;

        let id = Uuid::new_v4().to_string();
        let record = MemoryRecord {
            kind,
            content,
            metadata,
            timestamp: Utc::now().to_rfc3339(),
            id: Some(id.clone()),
            last_updated: None,
            extra: serde_json::Map::new(),
        };

        let mut data = self.load()?;
        data.memories.push(record);

        if data.memories.len() > self.max_items {
            let excess = data.memories.len() - self.max_items;
            data.memories.drain(..excess);
        }

        self.save(&data)?;
        debug!("Added {:?} memory record {}", kind, id);
        Ok(id)
    }

    /// Records filtered by kind if given, then truncated to the most recent
    /// `limit` of the filtered set (filter-then-tail).
    pub fn get(
        &self,
        kind: Option<MemoryKind>,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryRecord>> {
        let data = self.load()?;

        let mut records: Vec<MemoryRecord> = match kind {
            Some(kind) => data
                .memories
                .into_iter()
                .filter(|m| m.kind == kind)
                .collect(),
            None => data.memories,
        };

        if let Some(limit) = limit {
            if records.len() > limit {
                records.drain(..records.len() - limit);
            }
        }

        Ok(records)
    }

    /// Merge fields into the first record with a matching id and stamp
    /// `last_updated`. No-op (not an error) when no record matches.
    pub fn update(
        &self,
        id: &str,
        updates: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let _lock = StoreLock::acquire(&self.lock_path)?;
        let mut data = self.load()?;

        if let Some(record) = data
            .memories
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(id))
        {
            let mut value = serde_json::to_value(&*record)?;
            if let Some(object) = value.as_object_mut() {
                for (key, update) in updates {
                    object.insert(key, update);
                }
                object.insert(
                    "last_updated".to_string(),
                    serde_json::Value::String(Utc::now().to_rfc3339()),
                );
            }
            *record = serde_json::from_value(value)?;
            self.save(&data)?;
            debug!("Updated memory record {}", id);
        }

        Ok(())
    }

    /// Remove all records, or only those of the given kind.
    pub fn clear(&self, kind: Option<MemoryKind>) -> Result<()> {
        let _lock = StoreLock::acquire(&self.lock_path)?;
        let mut data = self.load()?;

        match kind {
            Some(kind) => data.memories.retain(|m| m.kind != kind),
            None => data.memories.clear(),
        }

        self.save(&data)?;
        info!("Cleared memory records ({:?})", kind);
        Ok(())
    }

    /// Total retained record count.
    pub fn count(&self, kind: Option<MemoryKind>) -> Result<usize> {
        Ok(self.get(kind, None)?.len())
    }

    fn load(&self) -> Result<MemoryFile> {
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Atomic replace, so the file is never observably truncated.
    fn save(&self, data: &MemoryFile) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(data)?)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
