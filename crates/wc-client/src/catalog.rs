//! Collection enumeration with per-collection object counts.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use wc_core::{ClassDefinition, CollectionInfo, ConsoleError, QueryPolicy, Result, Tenant};

use crate::manager::ClientManager;
use crate::query::{validate_name, AggregateQuery};
use crate::traits::VectorService;

pub const TRACING_TARGET: &str = "wc_client::catalog";

pub struct SchemaCatalog {
    clients: Arc<ClientManager>,
    count_concurrency: usize,
}

impl SchemaCatalog {
    pub fn new(clients: Arc<ClientManager>, policy: &QueryPolicy) -> Self {
        Self {
            clients,
            count_concurrency: policy.count_concurrency.max(1),
        }
    }

    /// Lists every collection with its properties and object count.
    ///
    /// A failed schema fetch fails the call. A failed count only zeroes that
    /// collection's count; schema order is preserved either way.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let client = self.clients.client()?;
        let classes = fetch_schema(client.as_ref()).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            collections = classes.len(),
            "Fetched schema, counting objects"
        );

        let infos = stream::iter(classes)
            .map(|class| {
                let client = client.clone();
                async move {
                    let count = count_or_zero(client.as_ref(), &class.name).await;
                    class.into_info(count)
                }
            })
            .buffered(self.count_concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(infos)
    }

    /// Looks up one collection's definition without counting its objects.
    pub async fn describe_collection(&self, name: &str) -> Result<ClassDefinition> {
        let client = self.clients.client()?;
        fetch_schema(client.as_ref())
            .await?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConsoleError::not_found(name))
    }

    pub async fn collection_names(&self) -> Result<Vec<String>> {
        let client = self.clients.client()?;
        Ok(fetch_schema(client.as_ref())
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Exact count for one collection; unlike the overview, failures propagate.
    pub async fn count(&self, name: &str, tenant: Option<String>) -> Result<u64> {
        validate_name("collection", name)?;
        let client = self.clients.client()?;
        client
            .count_objects(&AggregateQuery::new(name).tenant(tenant))
            .await
    }

    pub async fn list_tenants(&self, name: &str) -> Result<Vec<Tenant>> {
        validate_name("collection", name)?;
        let client = self.clients.client()?;
        let tenants = client.tenants(name).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            collection = name,
            tenants = tenants.len(),
            "Fetched tenants"
        );
        Ok(tenants)
    }
}

pub(crate) async fn fetch_schema(client: &dyn VectorService) -> Result<Vec<ClassDefinition>> {
    client.schema().await.map_err(|e| {
        tracing::error!(target: TRACING_TARGET, error = %e, "Schema fetch failed");
        e.into_schema()
    })
}

async fn count_or_zero(client: &dyn VectorService, name: &str) -> u64 {
    match client.count_objects(&AggregateQuery::new(name)).await {
        Ok(count) => {
            tracing::debug!(target: TRACING_TARGET, collection = name, count, "Counted objects");
            count
        }
        Err(e) => {
            tracing::warn!(
                target: TRACING_TARGET,
                collection = name,
                error = %e,
                "Count failed, reporting 0"
            );
            0
        }
    }
}
