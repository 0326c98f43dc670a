//! Data access for a vector database console.
//!
//! Owns the connection identity and client lifecycle, and provides schema
//! introspection, paged object reads, and mutations against the service.

pub mod catalog;
pub mod connection;
pub mod console;
pub mod endpoint;
pub mod http;
pub mod manager;
pub mod mutation;
pub mod query;
pub mod traits;

#[cfg(feature = "test-utils")]
pub mod mock;

pub use catalog::SchemaCatalog;
pub use connection::{connection_id, ConnectionState, ConnectionStore};
pub use console::Console;
pub use endpoint::Endpoint;
pub use http::{HttpConnector, HttpService};
pub use manager::{ClientManager, ConnectOutcome};
pub use mutation::{MutationOps, SeedOutcome};
pub use query::{AggregateQuery, ObjectQuery, QueryExecutor};
pub use traits::{BatchOutcome, Properties, ServiceConnector, VectorService};
