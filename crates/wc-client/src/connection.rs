//! Process-wide connection identity: the active service URL and the
//! fingerprint of the instance behind it.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use wc_core::{ConsoleError, Result, ServerMeta, ServiceConfig};

use crate::endpoint::Endpoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub url: String,
    /// Unset until the first successful reconnect.
    pub connection_id: Option<String>,
}

/// Holder of the current [`ConnectionState`]. All writes go through one mutex.
#[derive(Debug)]
pub struct ConnectionStore {
    state: Mutex<ConnectionState>,
}

impl ConnectionStore {
    /// Creates the store from the configured default URL.
    ///
    /// Fails with a configuration error when no default is configured or the
    /// configured value is not a usable URL.
    pub fn new(default_url: Option<&str>) -> Result<Self> {
        let raw = default_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ConsoleError::Configuration("no default service URL configured (set WEAVIATE_URL)".into())
            })?;
        let url = Endpoint::normalize(raw)
            .map_err(|e| ConsoleError::Configuration(format!("default service URL is invalid: {e}")))?;

        Ok(Self {
            state: Mutex::new(ConnectionState { url, connection_id: None }),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(config.default_url.as_deref())
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state.lock().url = url.into();
    }

    pub fn connection_id(&self) -> Option<String> {
        self.state.lock().connection_id.clone()
    }

    pub fn set_connection_id(&self, id: impl Into<String>) {
        self.state.lock().connection_id = Some(id.into());
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    /// Swaps URL and connection id together, returning the previous state.
    pub fn replace(&self, url: impl Into<String>, connection_id: impl Into<String>) -> ConnectionState {
        let mut state = self.state.lock();
        std::mem::replace(
            &mut *state,
            ConnectionState {
                url: url.into(),
                connection_id: Some(connection_id.into()),
            },
        )
    }
}

/// Fingerprint of a service instance: SHA-256 over `url|version|hostname`.
///
/// Two servers reachable at the same URL but reporting different metadata get
/// different ids.
pub fn connection_id(url: &str, meta: &ServerMeta) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"|");
    hasher.update(meta.version.as_bytes());
    hasher.update(b"|");
    hasher.update(meta.hostname.as_bytes());
    hex::encode(hasher.finalize())
}
