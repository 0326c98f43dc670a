//! Client handle lifecycle: lazy construction, memoization per URL, and the
//! probe-then-commit reconnect.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use wc_core::{ConsoleError, Result, ServerMeta, ServiceConfig};

use crate::connection::{connection_id, ConnectionStore};
use crate::endpoint::Endpoint;
use crate::traits::{ServiceConnector, VectorService};

pub const TRACING_TARGET: &str = "wc_client::manager";

/// Result of a reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutcome {
    pub url: String,
    pub connection_id: String,
    /// False when the probed instance matches the current connection id.
    pub new_connection: bool,
}

struct BoundClient {
    url: String,
    client: Arc<dyn VectorService>,
}

/// Owns the single live client handle and keeps it bound to the store's URL.
pub struct ClientManager {
    store: Arc<ConnectionStore>,
    connector: Arc<dyn ServiceConnector>,
    api_key: Option<String>,
    probe_timeout: Duration,
    /// Lock order: `bound` before the store's own mutex.
    bound: Mutex<Option<BoundClient>>,
    /// Serializes reconnects; held across the probes.
    reconnect: tokio::sync::Mutex<()>,
}

impl ClientManager {
    pub fn new(
        store: Arc<ConnectionStore>,
        connector: Arc<dyn ServiceConnector>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            store,
            connector,
            api_key: config.api_key.clone(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            bound: Mutex::new(None),
            reconnect: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<ConnectionStore> {
        &self.store
    }

    /// Returns the handle for the store's current URL, building it on a miss.
    ///
    /// A failed build leaves any previous handle in place.
    pub fn client(&self) -> Result<Arc<dyn VectorService>> {
        let mut bound = self.bound.lock();
        let url = self.store.url();

        if let Some(existing) = bound.as_ref() {
            if existing.url == url {
                return Ok(existing.client.clone());
            }
        }

        let endpoint = Endpoint::parse(&url, self.api_key.clone())
            .map_err(|e| ConsoleError::connectivity(format!("cannot build client for {url}: {e}")))?;
        let client = self.connector.connect(&endpoint).map_err(into_connectivity)?;

        tracing::info!(
            target: TRACING_TARGET,
            url = %url,
            host = endpoint.host(),
            port = endpoint.port(),
            authenticated = endpoint.api_key().is_some(),
            "Built service client"
        );

        *bound = Some(BoundClient { url, client: client.clone() });
        Ok(client)
    }

    /// Validates, probes and (if the instance changed) commits a new endpoint.
    ///
    /// Any failure leaves the current connection state untouched.
    pub async fn connect(&self, candidate: &str) -> Result<ConnectOutcome> {
        let endpoint = Endpoint::parse(candidate, self.api_key.clone())?;
        let _guard = self.reconnect.lock().await;

        let probe = self.probe_client(&endpoint)?;
        let meta = self.probe(probe.as_ref()).await?;
        let id = connection_id(endpoint.url(), &meta);

        let previous = self.store.snapshot();
        if previous.connection_id.as_deref() == Some(id.as_str()) {
            tracing::info!(
                target: TRACING_TARGET,
                url = %previous.url,
                connection_id = %id,
                "Reconnect reached the same instance"
            );
            return Ok(ConnectOutcome {
                url: previous.url,
                connection_id: id,
                new_connection: false,
            });
        }

        {
            let mut bound = self.bound.lock();
            self.store.replace(endpoint.url(), id.clone());
            *bound = Some(BoundClient {
                url: endpoint.url().to_string(),
                client: probe,
            });
        }

        tracing::info!(
            target: TRACING_TARGET,
            url = %endpoint.url(),
            connection_id = %id,
            server_version = %meta.version,
            server_host = %meta.hostname,
            "Connected to a different instance"
        );

        Ok(ConnectOutcome {
            url: endpoint.url().to_string(),
            connection_id: id,
            new_connection: true,
        })
    }

    /// Reuses the memoized handle when it already targets `endpoint`.
    fn probe_client(&self, endpoint: &Endpoint) -> Result<Arc<dyn VectorService>> {
        if let Some(existing) = self.bound.lock().as_ref() {
            if existing.url == endpoint.url() {
                return Ok(existing.client.clone());
            }
        }
        self.connector.connect(endpoint).map_err(into_connectivity)
    }

    async fn probe(&self, client: &dyn VectorService) -> Result<ServerMeta> {
        let url = client.endpoint().url().to_string();
        let limit = self.probe_timeout;

        tokio::time::timeout(limit, client.schema())
            .await
            .map_err(|_| {
                ConsoleError::connectivity(format!(
                    "schema probe to {url} timed out after {}ms",
                    limit.as_millis()
                ))
            })?
            .map_err(into_connectivity)?;

        let meta = tokio::time::timeout(limit, client.meta())
            .await
            .map_err(|_| {
                ConsoleError::connectivity(format!(
                    "meta probe to {url} timed out after {}ms",
                    limit.as_millis()
                ))
            })?
            .map_err(into_connectivity)?;

        Ok(meta)
    }
}

fn into_connectivity(err: ConsoleError) -> ConsoleError {
    match err {
        ConsoleError::Connectivity(_) => err,
        other => ConsoleError::connectivity(other.to_string()),
    }
}
