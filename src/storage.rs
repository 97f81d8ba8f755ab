use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::slots::SlotStore;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode slot store: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Reads the persisted store. A missing, unreadable or corrupt file yields an
/// empty store; the failure is only logged.
pub fn load_store(path: &Path) -> SlotStore {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no slot store yet, starting empty");
            return SlotStore::new();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read slot store, starting empty");
            return SlotStore::new();
        }
    };

    if raw.trim().is_empty() {
        return SlotStore::new();
    }

    match serde_json::from_str(&raw) {
        Ok(store) => store,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "slot store is not valid JSON, starting empty");
            SlotStore::new()
        }
    }
}

/// Serializes the whole store and replaces `path`. The JSON goes to a sibling
/// temp file first, so an interrupted save leaves the previous store intact.
pub fn save_store(path: &Path, store: &SlotStore) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let encoded = serde_json::to_string(store).map_err(StorageError::JsonEncode)?;
    let staging = staging_path(path);
    let written = fs::File::create(&staging)
        .and_then(|mut file| {
            file.write_all(encoded.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&staging, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&staging);
        return Err(StorageError::Io(err));
    }
    debug!(path = %path.display(), bytes = encoded.len(), "slot store persisted");

    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
