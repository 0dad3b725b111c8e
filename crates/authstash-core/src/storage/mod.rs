//! Persistence mirrors for the session store.
//!
//! Every backend speaks the same three-call key-value interface
//! (`get`, `set`, `remove`) over string keys and string values:
//! - `MemoryStore`: process memory only, for tests and throwaway sessions
//! - `FileStore`: a JSON object file on disk
//! - `KeyringStore`: one OS keychain entry per key (`keyring-native` feature)
//! - `LocalStorage`: the browser's `window.localStorage` (wasm32, `web` feature)

pub mod file;
#[cfg(all(not(target_arch = "wasm32"), feature = "keyring-native"))]
pub mod keychain;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod local;
pub mod memory;

pub use file::FileStore;
#[cfg(all(not(target_arch = "wasm32"), feature = "keyring-native"))]
pub use keychain::KeyringStore;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local::LocalStorage;
pub use memory::MemoryStore;

use crate::error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable string key-value store backing a session.
///
/// Removing a key that is not present must succeed.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
