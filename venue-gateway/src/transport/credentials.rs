//! Runtime-replaceable API credential.

use std::sync::RwLock;

/// Holds the API key consumed by the transport on every call.
///
/// The host may replace the key at any time; the next call picks it up.
#[derive(Debug, Default)]
pub struct CredentialStore {
    api_key: RwLock<Option<String>>,
}

impl CredentialStore {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: RwLock::new(api_key.filter(|k| !k.trim().is_empty())),
        }
    }

    /// Current key, if one is configured.
    pub fn get(&self) -> Option<String> {
        self.api_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the key. Blank keys clear it.
    pub fn set(&self, api_key: impl Into<String>) {
        let api_key = api_key.into();
        let mut guard = self
            .api_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key.trim().to_string())
        };
    }

    pub fn is_configured(&self) -> bool {
        self.get().is_some()
    }
}
