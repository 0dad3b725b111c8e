//! authstash core library.
//!
//! Keeps the signed-in user and their access/refresh tokens in memory and
//! mirrors them into durable key-value storage so a restart picks the
//! session back up.
//!
//! ```no_run
//! use authstash_core::{FileStore, SessionStore};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store: SessionStore<_> = SessionStore::open(FileStore::in_data_dir()?)?;
//! store.login(json!({"id": 1, "name": "ada"}), "access", "refresh")?;
//! assert_eq!(store.access_token(), Some("access"));
//! store.logout()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod session;
pub mod storage;

pub use error::{SessionError, StorageError};
pub use session::{
    Session, SessionState, SessionStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY,
};
#[cfg(all(not(target_arch = "wasm32"), feature = "keyring-native"))]
pub use storage::KeyringStore;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use storage::LocalStorage;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
