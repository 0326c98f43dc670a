use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use wc_core::{ClassDefinition, RecordRow, Result, ServerMeta, Tenant, Value};

use crate::endpoint::Endpoint;
use crate::query::{AggregateQuery, ObjectQuery};

/// Property values of one object to insert.
pub type Properties = BTreeMap<String, Value>;

/// Per-object tally reported by a batch mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

/// Typed client for one vector database instance.
#[async_trait]
pub trait VectorService: Send + Sync {
    /// The endpoint this handle was built for.
    fn endpoint(&self) -> &Endpoint;

    /// All collection definitions, in schema order.
    async fn schema(&self) -> Result<Vec<ClassDefinition>>;

    async fn meta(&self) -> Result<ServerMeta>;

    async fn fetch_objects(&self, query: &ObjectQuery) -> Result<Vec<RecordRow>>;

    async fn count_objects(&self, query: &AggregateQuery) -> Result<u64>;

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<BatchOutcome>;

    async fn delete_collection(&self, name: &str) -> Result<()>;

    async fn create_collection(&self, definition: &ClassDefinition) -> Result<()>;

    async fn insert_many(&self, collection: &str, rows: &[Properties]) -> Result<BatchOutcome>;

    async fn tenants(&self, collection: &str) -> Result<Vec<Tenant>>;
}

/// Builds client handles for an endpoint. Construction performs no I/O.
pub trait ServiceConnector: Send + Sync {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn VectorService>>;
}
