use std::collections::HashMap;

use super::{KeyValueStore, Result};

/// In-process mirror. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let mut store = MemoryStore::new();
        assert!(store.remove("nope").is_ok());
    }

    #[test]
    fn test_from_iter() {
        let store: MemoryStore = [("x", "1"), ("y", "2")].into_iter().collect();
        assert!(store.contains_key("x"));
        assert_eq!(store.get("y").unwrap().as_deref(), Some("2"));
    }
}
