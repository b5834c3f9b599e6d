//! In-memory store used for the session scope

use super::SessionStore;
use crate::CoreResult;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-lifetime key/value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn items(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> CoreResult<()> {
        let mut guard = self.items();
        for (key, value) in items {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> CoreResult<()> {
        let mut guard = self.items();
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set_items(&[("a", "1"), ("b", "2")]).unwrap();

        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 2);

        store.remove_items(&["a", "missing"]).unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
        assert_eq!(store.get_item("b").unwrap().as_deref(), Some("2"));
    }
}
