// Key/value storage tiers backing the session.
//
// Two tiers exist: a durable one that survives restarts and a
// session-scoped one that lives as long as the process. The store reads
// the durable tier first.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::Error;

/// One storage tier: string slots keyed by name.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// In-process tier. Gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.remove(key);
        Ok(())
    }
}

/// Durable tier: a single JSON object file.
///
/// Every operation re-reads the file so a second process sees the latest
/// write. Writes go to an owner-only sibling temp file which is then
/// renamed over the original. Concurrent writers from different processes race; the last
/// rename wins.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, Error> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| Error::Deserialization {
            message: format!("{}: {e}", self.path.display()),
            body: raw,
        })
    }

    fn store(&self, slots: &BTreeMap<String, String>) -> Result<(), Error> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Storage(format!("failed to create {}: {e}", parent.display())))?;
        let body = serde_json::to_string_pretty(slots)
            .map_err(|e| Error::Storage(format!("failed to encode session: {e}")))?;

        // Created 0600; the file holds the bearer token.
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| {
            Error::Storage(format!("failed to create temp file in {}: {e}", parent.display()))
        })?;
        tmp.write_all(body.as_bytes())
            .map_err(|e| Error::Storage(format!("failed to write session: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            Error::Storage(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;
        trace!(path = %self.path.display(), "session file written");
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut slots = self.load()?;
        slots.insert(key.to_owned(), value.to_owned());
        self.store(&slots)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut slots = self.load()?;
        if slots.remove(key).is_some() {
            self.store(&slots)?;
        }
        Ok(())
    }
}

fn poisoned() -> Error {
    Error::Storage("storage lock poisoned".into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("adminToken").unwrap(), None);
        storage.set("adminToken", "T").unwrap();
        assert_eq!(storage.get("adminToken").unwrap().as_deref(), Some("T"));
        storage.remove("adminToken").unwrap();
        assert_eq!(storage.get("adminToken").unwrap(), None);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStorage::new(&path).set("adminToken", "T").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("adminToken").unwrap().as_deref(), Some("T"));
        reopened.remove("adminToken").unwrap();
        assert_eq!(FileStorage::new(&path).get("adminToken").unwrap(), None);
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileStorage::new(&path).set("adminToken", "SECRET").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "session file mode is {mode:o}");
    }

    #[test]
    fn file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get("adminInfo").unwrap(), None);
        storage.remove("adminInfo").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn file_storage_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileStorage::new(&path).get("adminToken").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }
}
