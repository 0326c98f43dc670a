//! In-memory stand-in for the vector database service.
//!
//! Only available with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! wc-client = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! A [`MockServer`] holds collections and objects; a [`MockConnector`] maps
//! URLs to servers. Handles built for an unregistered URL behave like an
//! unreachable host.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use wc_core::{ClassDefinition, ConsoleError, RecordRow, Result, ServerMeta, SortOrder, Tenant};

use crate::endpoint::Endpoint;
use crate::query::{AggregateQuery, ObjectQuery};
use crate::traits::{BatchOutcome, Properties, ServiceConnector, VectorService};

struct MockCollection {
    definition: ClassDefinition,
    objects: Vec<RecordRow>,
    tenants: Vec<Tenant>,
}

struct MockData {
    meta: ServerMeta,
    collections: Vec<MockCollection>,
    failing_counts: HashSet<String>,
    schema_broken: bool,
    schema_delay: Option<Duration>,
}

/// One simulated service instance. Clones share state.
#[derive(Clone)]
pub struct MockServer {
    data: Arc<Mutex<MockData>>,
    mutations: Arc<AtomicUsize>,
    queries: Arc<AtomicUsize>,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new("1.24.0", "mock-node")
    }
}

impl MockServer {
    pub fn new(version: &str, hostname: &str) -> Self {
        Self {
            data: Arc::new(Mutex::new(MockData {
                meta: ServerMeta::new(version, hostname),
                collections: Vec::new(),
                failing_counts: HashSet::new(),
                schema_broken: false,
                schema_delay: None,
            })),
            mutations: Arc::new(AtomicUsize::new(0)),
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_collection(self, definition: ClassDefinition, objects: Vec<RecordRow>) -> Self {
        self.add_collection(definition, objects);
        self
    }

    pub fn add_collection(&self, definition: ClassDefinition, objects: Vec<RecordRow>) {
        self.data.lock().collections.push(MockCollection {
            definition,
            objects,
            tenants: Vec::new(),
        });
    }

    pub fn set_tenants(&self, collection: &str, tenants: Vec<Tenant>) {
        if let Some(c) = self.data.lock().collections.iter_mut().find(|c| c.definition.name == collection) {
            c.tenants = tenants;
        }
    }

    /// Makes the aggregate count for `collection` fail like a timed-out request.
    pub fn fail_count_for(&self, collection: &str) {
        self.data.lock().failing_counts.insert(collection.to_string());
    }

    /// Makes schema fetches return a malformed-document error.
    pub fn break_schema(&self) {
        self.data.lock().schema_broken = true;
    }

    pub fn set_schema_delay(&self, delay: Duration) {
        self.data.lock().schema_delay = Some(delay);
    }

    /// Changes the reported identity, as a restart with new metadata would.
    pub fn set_meta(&self, meta: ServerMeta) {
        self.data.lock().meta = meta;
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.data.lock().collections.iter().map(|c| c.definition.name.clone()).collect()
    }

    pub fn object_count(&self, collection: &str) -> Option<usize> {
        self.data
            .lock()
            .collections
            .iter()
            .find(|c| c.definition.name == collection)
            .map(|c| c.objects.len())
    }

    /// Number of mutating calls received.
    pub fn mutations(&self) -> usize {
        self.mutations.load(AtomicOrdering::SeqCst)
    }

    /// Number of object reads received.
    pub fn queries(&self) -> usize {
        self.queries.load(AtomicOrdering::SeqCst)
    }
}

/// Hands out [`MockService`] handles and counts how many it built.
#[derive(Default)]
pub struct MockConnector {
    servers: Mutex<HashMap<String, MockServer>>,
    constructions: AtomicUsize,
    fail_construction: AtomicBool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `server` at `url` (normalized before registration).
    pub fn register(&self, url: &str, server: MockServer) -> Result<()> {
        let url = Endpoint::normalize(url)?;
        self.servers.lock().insert(url, server);
        Ok(())
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(AtomicOrdering::SeqCst)
    }

    pub fn set_fail_construction(&self, fail: bool) {
        self.fail_construction.store(fail, AtomicOrdering::SeqCst);
    }
}

impl ServiceConnector for MockConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn VectorService>> {
        if self.fail_construction.load(AtomicOrdering::SeqCst) {
            return Err(ConsoleError::connectivity(format!(
                "cannot build client for {}",
                endpoint.url()
            )));
        }
        self.constructions.fetch_add(1, AtomicOrdering::SeqCst);
        let server = self.servers.lock().get(endpoint.url()).cloned();
        Ok(Arc::new(MockService {
            endpoint: endpoint.clone(),
            server,
        }))
    }
}

pub struct MockService {
    endpoint: Endpoint,
    server: Option<MockServer>,
}

impl MockService {
    fn server(&self) -> Result<&MockServer> {
        self.server.as_ref().ok_or_else(|| {
            ConsoleError::connectivity(format!("connection refused: {}", self.endpoint.url()))
        })
    }
}

fn no_such_class(name: &str) -> ConsoleError {
    ConsoleError::query(format!("class '{name}' does not exist"))
}

#[async_trait]
impl VectorService for MockService {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn schema(&self) -> Result<Vec<ClassDefinition>> {
        let server = self.server()?;
        let delay = server.data.lock().schema_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let data = server.data.lock();
        if data.schema_broken {
            return Err(ConsoleError::schema("malformed schema document"));
        }
        Ok(data.collections.iter().map(|c| c.definition.clone()).collect())
    }

    async fn meta(&self) -> Result<ServerMeta> {
        Ok(self.server()?.data.lock().meta.clone())
    }

    async fn fetch_objects(&self, query: &ObjectQuery) -> Result<Vec<RecordRow>> {
        let server = self.server()?;
        server.queries.fetch_add(1, AtomicOrdering::SeqCst);
        let data = server.data.lock();
        let collection = data
            .collections
            .iter()
            .find(|c| c.definition.name == query.collection)
            .ok_or_else(|| no_such_class(&query.collection))?;

        let mut objects: Vec<&RecordRow> = collection.objects.iter().collect();
        if let Some(sort) = &query.sort {
            if collection.definition.find_property(&sort.property).is_none() {
                return Err(ConsoleError::query(format!(
                    "no such prop with name '{}' found in class '{}'",
                    sort.property, query.collection
                )));
            }
            objects.sort_by(|a, b| {
                let ord = match (a.get(&sort.property), b.get(&sort.property)) {
                    (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match sort.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        Ok(objects
            .into_iter()
            .skip(query.page.offset)
            .take(query.page.limit)
            .map(|row| {
                let mut projected = RecordRow::new(row.identity.clone());
                for name in &query.properties {
                    if let Some(value) = row.get(name) {
                        projected.properties.insert(name.clone(), value.clone());
                    }
                }
                projected
            })
            .collect())
    }

    async fn count_objects(&self, query: &AggregateQuery) -> Result<u64> {
        let data = self.server()?.data.lock();
        if data.failing_counts.contains(&query.collection) {
            return Err(ConsoleError::connectivity("aggregate query timed out"));
        }
        data.collections
            .iter()
            .find(|c| c.definition.name == query.collection)
            .map(|c| c.objects.len() as u64)
            .ok_or_else(|| no_such_class(&query.collection))
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<BatchOutcome> {
        let server = self.server()?;
        server.mutations.fetch_add(1, AtomicOrdering::SeqCst);
        let mut data = server.data.lock();
        let target = data
            .collections
            .iter_mut()
            .find(|c| c.definition.name == collection)
            .ok_or_else(|| no_such_class(collection))?;

        let before = target.objects.len();
        target.objects.retain(|row| !ids.contains(&row.identity));
        Ok(BatchOutcome {
            succeeded: before - target.objects.len(),
            failed: 0,
        })
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let server = self.server()?;
        server.mutations.fetch_add(1, AtomicOrdering::SeqCst);
        server.data.lock().collections.retain(|c| c.definition.name != name);
        Ok(())
    }

    async fn create_collection(&self, definition: &ClassDefinition) -> Result<()> {
        let server = self.server()?;
        server.mutations.fetch_add(1, AtomicOrdering::SeqCst);
        let mut data = server.data.lock();
        if data.collections.iter().any(|c| c.definition.name == definition.name) {
            return Err(ConsoleError::query(format!(
                "class name '{}' already exists",
                definition.name
            )));
        }
        data.collections.push(MockCollection {
            definition: definition.clone(),
            objects: Vec::new(),
            tenants: Vec::new(),
        });
        Ok(())
    }

    async fn insert_many(&self, collection: &str, rows: &[Properties]) -> Result<BatchOutcome> {
        let server = self.server()?;
        server.mutations.fetch_add(1, AtomicOrdering::SeqCst);
        let mut data = server.data.lock();
        let target = data
            .collections
            .iter_mut()
            .find(|c| c.definition.name == collection)
            .ok_or_else(|| no_such_class(collection))?;

        for properties in rows {
            target.objects.push(RecordRow {
                identity: uuid::Uuid::new_v4().to_string(),
                properties: properties.clone(),
            });
        }
        Ok(BatchOutcome {
            succeeded: rows.len(),
            failed: 0,
        })
    }

    async fn tenants(&self, collection: &str) -> Result<Vec<Tenant>> {
        let data = self.server()?.data.lock();
        data.collections
            .iter()
            .find(|c| c.definition.name == collection)
            .map(|c| c.tenants.clone())
            .ok_or_else(|| no_such_class(collection))
    }
}
