use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{KeyValueStore, Result};
use crate::error::StorageError;

/// Default file name for the mirror inside its directory
pub const SESSION_FILE: &str = "session.json";

/// Application directory name under the platform data dir
const APP_NAME: &str = "authstash";

/// Mirror kept as a single JSON object file.
///
/// The file is re-read on every call so that changes made by another
/// process show up on the next `get`. It is removed once it holds no keys.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `dir/session.json`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Store backed by an explicit file path
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory, e.g. `~/.local/share/authstash`
    pub fn in_data_dir() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            StorageError::Unavailable("could not find data directory".to_string())
        })?;
        Ok(Self::new(data_dir.join(APP_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
                debug!(path = %self.path.display(), "Removed empty session file");
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            StorageError::Encode {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        // Write beside the target and rename over it so a crash never
        // leaves a half-written file behind
        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, contents)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| SESSION_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    /// A corrupt file cannot be edited key by key, so removing any key
    /// deletes the whole file.
    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt { .. }) => {
                warn!(path = %self.path.display(), key, "Deleting corrupt session file");
                std::fs::remove_file(&self.path)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("user").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));
        store.set("access_token", "A").unwrap();
        store.set("refresh_token", "R").unwrap();

        let reopened = FileStore::new(dir.path().join("nested"));
        assert_eq!(reopened.get("access_token").unwrap().as_deref(), Some("A"));
        assert_eq!(reopened.get("refresh_token").unwrap().as_deref(), Some("R"));
    }

    #[test]
    fn test_file_removed_when_last_key_goes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        store.remove("a").unwrap();
        assert!(store.path().exists());

        store.remove("b").unwrap();
        assert!(!store.path().exists());

        // Nothing left to remove
        store.remove("b").unwrap();
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = FileStore::at_path(&path);
        let err = store.get("user").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_remove_deletes_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        // Truncated mid-write
        std::fs::write(store.path(), r#"{"user": "#).unwrap();

        store.remove("user").unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get("user").unwrap(), None);

        // Later removals see a missing file and do nothing
        store.remove("access_token").unwrap();
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.set("access_token", "A").unwrap();
        store.set("access_token", "B").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(SESSION_FILE)]);
        assert_eq!(store.get("access_token").unwrap().as_deref(), Some("B"));
    }
}
