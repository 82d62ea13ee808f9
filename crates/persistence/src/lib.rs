#![deny(warnings)]

//! Persistence layer: text codec for the progress tree and the key-value
//! storage it is written to.

use camo_core::ProgressModel;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Well-known key the progress snapshot lives under.
pub const SAVE_KEY: &str = "savedata";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode progress: {0}")]
    Encode(String),
    #[error("failed to decode progress: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Encode a progress tree. Every mapping level becomes a tagged
/// `{"__kind":"map","entries":[...]}` node.
pub fn encode(model: &ProgressModel) -> Result<String, CodecError> {
    serde_json::to_string(model).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode text produced by [`encode`] (or the older `dataType: "Map"` form).
pub fn decode(text: &str) -> Result<ProgressModel, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Durable string store addressed by key.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

fn check_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// One `<key>.json` file per key inside a save directory.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a half-written snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        check_key(key)?;
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.items.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Read the snapshot under `key`. `Ok(None)` means nothing was ever saved;
/// a blob that is present but unreadable is a [`CodecError::Decode`].
pub fn read_snapshot<S: Storage + ?Sized>(
    storage: &S,
    key: &str,
) -> Result<Option<ProgressModel>, PersistError> {
    let Some(text) = storage.get(key)? else {
        info!(key, "no saved progress");
        return Ok(None);
    };
    let model = decode(&text)?;
    debug!(key, version = model.version, bytes = text.len(), "progress restored");
    Ok(Some(model))
}

/// Write a full snapshot of `model` under `key`.
pub fn write_snapshot<S: Storage + ?Sized>(
    storage: &mut S,
    key: &str,
    model: &ProgressModel,
) -> Result<(), PersistError> {
    let text = encode(model)?;
    storage.set(key, &text)?;
    debug!(key, bytes = text.len(), "progress saved");
    Ok(())
}
