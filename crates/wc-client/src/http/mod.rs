//! reqwest-backed client for the service's REST and GraphQL endpoints.

pub mod graphql;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use wc_core::{ClassDefinition, ConsoleError, RecordRow, Result, ServerMeta, Tenant};

use crate::endpoint::Endpoint;
use crate::query::{AggregateQuery, ObjectQuery};
use crate::traits::{BatchOutcome, Properties, ServiceConnector, VectorService};

pub const TRACING_TARGET: &str = "wc_client::http";

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    classes: Option<Vec<ClassDefinition>>,
}

/// Builds [`HttpService`] handles.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl ServiceConnector for HttpConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn VectorService>> {
        Ok(Arc::new(HttpService::new(endpoint.clone())?))
    }
}

/// Client for one service endpoint.
///
/// Requests carry no timeout of their own; reconnect probes are bounded by
/// the caller.
pub struct HttpService {
    http: Client,
    endpoint: Endpoint,
}

impl std::fmt::Debug for HttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpService")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpService {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = endpoint.api_key() {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ConsoleError::connectivity(format!("invalid API key: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .user_agent(concat!("wc-client/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| ConsoleError::connectivity(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, endpoint })
    }

    /// Sends a request; transport failures are connectivity errors and
    /// non-success statuses are query errors.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(target: TRACING_TARGET, url = %self.endpoint.url(), error = %e, "{what} failed");
            ConsoleError::connectivity(format!("{what} failed: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(512)
            .collect();
        tracing::warn!(
            target: TRACING_TARGET,
            url = %self.endpoint.url(),
            status = status.as_u16(),
            "{what} rejected"
        );
        Err(ConsoleError::query(format!("{what} failed: status {status}: {body}")))
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response, what: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ConsoleError::query(format!("{what} returned an unreadable body: {e}")))
    }

    async fn graphql(&self, query: &str) -> Result<serde_json::Value> {
        tracing::trace!(target: TRACING_TARGET, query, "GraphQL request");
        let request = self
            .http
            .post(self.endpoint.join("/v1/graphql"))
            .json(&json!({ "query": query }));
        let response = self.send(request, "GraphQL query").await?;
        self.read_json(response, "GraphQL query").await
    }
}

#[async_trait]
impl VectorService for HttpService {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn schema(&self) -> Result<Vec<ClassDefinition>> {
        let response = self
            .send(self.http.get(self.endpoint.join("/v1/schema")), "Schema fetch")
            .await?;
        let doc: SchemaDocument = response
            .json()
            .await
            .map_err(|e| ConsoleError::schema(format!("malformed schema document: {e}")))?;
        Ok(doc.classes.unwrap_or_default())
    }

    async fn meta(&self) -> Result<ServerMeta> {
        let response = self
            .send(self.http.get(self.endpoint.join("/v1/meta")), "Meta fetch")
            .await?;
        self.read_json(response, "Meta fetch").await
    }

    async fn fetch_objects(&self, query: &ObjectQuery) -> Result<Vec<RecordRow>> {
        let body = self.graphql(&query.to_graphql()).await?;
        graphql::parse_get_response(&query.collection, body)
    }

    async fn count_objects(&self, query: &AggregateQuery) -> Result<u64> {
        let body = self.graphql(&query.to_graphql()).await?;
        graphql::parse_aggregate_response(&query.collection, &body)
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<BatchOutcome> {
        let body = json!({
            "match": {
                "class": collection,
                "where": {
                    "path": ["id"],
                    "operator": "ContainsAny",
                    "valueTextArray": ids,
                }
            },
            "output": "minimal",
        });
        let request = self
            .http
            .delete(self.endpoint.join("/v1/batch/objects"))
            .json(&body);
        let response = self.send(request, "Batch delete").await?;
        let result: serde_json::Value = self.read_json(response, "Batch delete").await?;
        Ok(graphql::parse_delete_response(&result))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let request = self.http.delete(self.endpoint.join(&format!("/v1/schema/{name}")));
        self.send(request, "Collection delete").await?;
        Ok(())
    }

    async fn create_collection(&self, definition: &ClassDefinition) -> Result<()> {
        let request = self
            .http
            .post(self.endpoint.join("/v1/schema"))
            .json(definition);
        self.send(request, "Collection create").await?;
        Ok(())
    }

    async fn insert_many(&self, collection: &str, rows: &[Properties]) -> Result<BatchOutcome> {
        let objects: Vec<serde_json::Value> = rows
            .iter()
            .map(|properties| json!({ "class": collection, "properties": properties }))
            .collect();
        let request = self
            .http
            .post(self.endpoint.join("/v1/batch/objects"))
            .json(&json!({ "objects": objects }));
        let response = self.send(request, "Batch insert").await?;
        let result: serde_json::Value = self.read_json(response, "Batch insert").await?;
        Ok(graphql::parse_insert_response(&result))
    }

    async fn tenants(&self, collection: &str) -> Result<Vec<Tenant>> {
        let request = self
            .http
            .get(self.endpoint.join(&format!("/v1/schema/{collection}/tenants")));
        let response = self.send(request, "Tenant listing").await?;
        self.read_json(response, "Tenant listing").await
    }
}
