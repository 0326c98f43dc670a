//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;
use wc_client::{Console, ServiceConnector};
use wc_core::{ConsoleConfig, Result};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub console: Arc<Console>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(console: Console) -> Self {
        Self {
            console: Arc::new(console),
            start_time: Instant::now(),
        }
    }

    /// State backed by the HTTP client.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        Ok(Self::new(Console::with_http(config)?))
    }

    pub fn with_connector(config: &ConsoleConfig, connector: Arc<dyn ServiceConnector>) -> Result<Self> {
        Ok(Self::new(Console::new(config, connector)?))
    }
}
