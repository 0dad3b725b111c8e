use keyring::Entry;
use tracing::debug;

use super::{KeyValueStore, Result};

/// Default keychain service name
pub const SERVICE_NAME: &str = "authstash";

/// Mirror kept in the OS keychain, one entry per key.
///
/// Each key becomes the entry's user name under a shared service name.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, key, "No keychain entry to delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn use_mock_keychain() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
    }

    #[test]
    fn test_missing_entry_reads_absent() {
        use_mock_keychain();
        let store = KeyringStore::new("authstash-test-missing");
        assert_eq!(store.get("access_token").unwrap(), None);
    }

    #[test]
    fn test_remove_missing_entry_is_ok() {
        use_mock_keychain();
        let mut store = KeyringStore::new("authstash-test-remove");
        assert!(store.remove("refresh_token").is_ok());
    }

    #[test]
    #[ignore = "needs a real OS keychain; run with --ignored"]
    fn test_values_survive_new_instance() {
        let service = format!("authstash-test-{}", std::process::id());
        let mut store = KeyringStore::new(&service);
        store.set("access_token", "A").unwrap();

        let mut reopened = KeyringStore::new(&service);
        assert_eq!(reopened.get("access_token").unwrap().as_deref(), Some("A"));

        reopened.remove("access_token").unwrap();
        reopened.remove("access_token").unwrap();
        assert_eq!(store.get("access_token").unwrap(), None);
    }
}
