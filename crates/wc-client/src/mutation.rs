//! Destructive operations and the demo collection seed.

use chrono::DateTime;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use wc_core::{ClassDefinition, ConsoleError, PropertyInfo, Result, SeedConfig, Value};

use crate::catalog::fetch_schema;
use crate::manager::ClientManager;
use crate::query::validate_name;
use crate::traits::Properties;

pub const TRACING_TARGET: &str = "wc_client::mutation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub collection: String,
    pub inserted: usize,
}

pub struct MutationOps {
    clients: Arc<ClientManager>,
    seed: SeedConfig,
}

impl MutationOps {
    pub fn new(clients: Arc<ClientManager>, seed: SeedConfig) -> Self {
        Self { clients, seed }
    }

    /// Deletes objects by identity in one batch.
    ///
    /// An empty id set is a no-op. Ids the service does not know are not
    /// reported; only transport-level failures are.
    pub async fn delete_objects(&self, collection: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            tracing::debug!(target: TRACING_TARGET, collection, "No ids to delete");
            return Ok(());
        }
        validate_name("collection", collection)?;

        let mut seen = HashSet::new();
        let unique: Vec<String> = ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();

        let client = self.clients.client()?;
        let outcome = client.delete_many(collection, &unique).await?;

        tracing::info!(
            target: TRACING_TARGET,
            collection,
            requested = unique.len(),
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Deleted objects"
        );
        Ok(())
    }

    /// Drops a collection and all its objects.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_name("collection", name)?;
        let client = self.clients.client()?;

        let exists = fetch_schema(client.as_ref()).await?.iter().any(|c| c.name == name);
        if !exists {
            return Err(ConsoleError::not_found(name));
        }

        client.delete_collection(name).await?;
        tracing::info!(target: TRACING_TARGET, collection = name, "Deleted collection");
        Ok(())
    }

    /// Creates the demo collection and fills it with sample objects.
    ///
    /// Fails without writing anything when the demo collection already exists.
    /// A partially failed insert is reported, not retried.
    pub async fn create_seed_collection(&self) -> Result<SeedOutcome> {
        let name = self.seed.collection.as_str();
        validate_name("collection", name)?;
        let client = self.clients.client()?;

        let exists = fetch_schema(client.as_ref()).await?.iter().any(|c| c.name == name);
        if exists {
            return Err(ConsoleError::validation(format!("collection '{name}' already exists")));
        }

        client.create_collection(&seed_definition(name)).await?;

        let rows = seed_rows()?;
        let outcome = client.insert_many(name, &rows).await?;
        if outcome.failed > 0 {
            return Err(ConsoleError::query(format!(
                "seed insert into '{name}' rejected {} of {} objects",
                outcome.failed,
                rows.len()
            )));
        }

        tracing::info!(
            target: TRACING_TARGET,
            collection = name,
            inserted = outcome.succeeded,
            "Created seed collection"
        );
        Ok(SeedOutcome {
            collection: name.to_string(),
            inserted: outcome.succeeded,
        })
    }
}

/// Schema of the demo collection: two text fields, an int and a date.
pub fn seed_definition(name: &str) -> ClassDefinition {
    ClassDefinition::new(name)
        .description("Sample collection created from the console")
        .property(PropertyInfo::new("title", &["text"]).with_description("Article title"))
        .property(PropertyInfo::new("body", &["text"]).with_description("Article body"))
        .property(PropertyInfo::new("wordCount", &["int"]))
        .property(PropertyInfo::new("publishedAt", &["date"]))
}

pub fn seed_rows() -> Result<Vec<Properties>> {
    let samples = [
        (
            "Getting started with vector search",
            "Vector databases store embeddings next to the objects they describe.",
            11,
            "2024-01-15T09:30:00Z",
        ),
        (
            "Paging through large collections",
            "Use limit and offset to walk a collection one window at a time.",
            12,
            "2024-02-20T14:00:00Z",
        ),
        (
            "Sorting by date",
            "Date properties can be sorted ascending or descending.",
            8,
            "2024-03-05T18:45:00Z",
        ),
    ];

    samples
        .iter()
        .map(|(title, body, words, published)| {
            let published = DateTime::parse_from_rfc3339(published)
                .map_err(|e| ConsoleError::Other(e.into()))?;
            let mut row = Properties::new();
            row.insert("title".into(), Value::from(*title));
            row.insert("body".into(), Value::from(*body));
            row.insert("wordCount".into(), Value::Int(*words));
            row.insert("publishedAt".into(), Value::from(published));
            Ok(row)
        })
        .collect()
}
