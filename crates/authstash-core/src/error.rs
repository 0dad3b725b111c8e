use thiserror::Error;

/// Failures raised by a persistence mirror.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file {path}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode storage file {path}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(all(not(target_arch = "wasm32"), feature = "keyring-native"))]
    #[error("Keychain access failed")]
    Keyring(#[from] keyring::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend rejected {op} for key '{key}': {message}")]
    Backend {
        op: &'static str,
        key: String,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Persisted user is not valid JSON")]
    MalformedUser {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize user")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True when the error came from reading back a bad `user` value
    pub fn is_malformed(&self) -> bool {
        matches!(self, SessionError::MalformedUser { .. })
    }

    /// True when the persisted session is unreadable and wiping it is the
    /// only way forward: a bad `user` value or a corrupt backing file
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            SessionError::MalformedUser { .. } | SessionError::Storage(StorageError::Corrupt { .. })
        )
    }
}
