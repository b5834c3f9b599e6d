//! JSON file store used for the persistent scope on native targets

use super::SessionStore;
use crate::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

type Items = BTreeMap<String, String>;

/// Key/value store persisted as a single JSON object on disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> CoreResult<Items> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Items::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Items::new());
        }

        match serde_json::from_str(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(
                    "Ignoring unreadable store file {}: {e}",
                    self.path.display()
                );
                Ok(Items::new())
            }
        }
    }

    fn write(&self, items: &Items) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write to a sibling file and rename so readers never see half a record
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            CoreError::io_error(format!(
                "Failed to replace {}: {e}",
                self.path.display()
            ))
        })?;
        debug!("Wrote {} keys to {}", items.len(), self.path.display());
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Items)) -> CoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.read()?;
        f(&mut items);
        self.write(&items)
    }
}

impl SessionStore for FileStore {
    fn get_item(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.read()?.remove(key))
    }

    fn set_items(&self, items: &[(&str, &str)]) -> CoreResult<()> {
        self.update(|stored| {
            for (key, value) in items {
                stored.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_items(&self, keys: &[&str]) -> CoreResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|stored| {
            for key in keys {
                stored.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("credentials.json");

        FileStore::new(&path)
            .set_items(&[("ACCESS_TOKEN", "abc"), ("REFRESH_TOKEN", "def")])
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get_item("ACCESS_TOKEN").unwrap().as_deref(),
            Some("abc")
        );
        assert_eq!(
            reopened.get_item("REFRESH_TOKEN").unwrap().as_deref(),
            Some("def")
        );
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("absent.json"));

        assert_eq!(store.get_item("user").unwrap(), None);
        store.remove_items(&["user"]).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_reads_empty_and_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get_item("user").unwrap(), None);

        store.set_items(&[("user", "{}")]).unwrap();
        assert_eq!(store.get_item("user").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("credentials.json"));
        store.set_items(&[("a", "1"), ("b", "2")]).unwrap();

        store.remove_items(&["a"]).unwrap();

        assert_eq!(store.get_item("a").unwrap(), None);
        assert_eq!(store.get_item("b").unwrap().as_deref(), Some("2"));
    }
}
