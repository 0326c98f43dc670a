//! The data-access layer wired together from one configuration.

use std::sync::Arc;
use wc_core::{ConsoleConfig, Result};

use crate::catalog::SchemaCatalog;
use crate::connection::ConnectionStore;
use crate::http::HttpConnector;
use crate::manager::ClientManager;
use crate::mutation::MutationOps;
use crate::query::QueryExecutor;
use crate::traits::ServiceConnector;

/// Every component shares one [`ConnectionStore`] and one [`ClientManager`].
pub struct Console {
    pub store: Arc<ConnectionStore>,
    pub clients: Arc<ClientManager>,
    pub catalog: SchemaCatalog,
    pub queries: QueryExecutor,
    pub mutations: MutationOps,
}

impl Console {
    /// Fails with a configuration error when no default URL is configured.
    pub fn new(config: &ConsoleConfig, connector: Arc<dyn ServiceConnector>) -> Result<Self> {
        let store = Arc::new(ConnectionStore::from_config(&config.service)?);
        let clients = Arc::new(ClientManager::new(store.clone(), connector, &config.service));

        Ok(Self {
            catalog: SchemaCatalog::new(clients.clone(), &config.query),
            queries: QueryExecutor::new(clients.clone(), config.query.clone()),
            mutations: MutationOps::new(clients.clone(), config.seed.clone()),
            store,
            clients,
        })
    }

    pub fn with_http(config: &ConsoleConfig) -> Result<Self> {
        Self::new(config, Arc::new(HttpConnector::new()))
    }
}
