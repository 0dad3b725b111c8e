//! Browser `localStorage` mirror.
//!
//! Requires a window; on a worker or with storage disabled every call
//! fails with `StorageError::Unavailable`.

use wasm_bindgen::JsValue;

use super::{KeyValueStore, Result};
use crate::error::StorageError;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_message(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_string()))
    }
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn backend_error(op: &'static str, key: &str, value: JsValue) -> StorageError {
    StorageError::Backend {
        op,
        key: key.to_string(),
        message: js_message(&value),
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| backend_error("get", key, e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Quota errors surface here
        self.storage()?
            .set_item(key, value)
            .map_err(|e| backend_error("set", key, e))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| backend_error("remove", key, e))
    }
}
