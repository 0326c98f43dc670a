use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use wc_client::ObjectQuery;
use wc_core::{ClassDefinition, ConsoleError, SortOrder, SortSpec};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const TRACING_TARGET: &str = "wc_server::routes";

const SEED_ACTION: &str = "create-test";

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/api/collections", get(list_collections).post(collection_action))
        .route(
            "/api/collection/{name}",
            get(fetch_collection_data).delete(delete_from_collection),
        )
        .route("/api/collection/{name}/tenants", get(list_tenants))
}

pub fn connection_routes() -> Router<AppState> {
    Router::new().route("/api/connection", get(connection_status).post(set_connection))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptimeSecs": state.start_time.elapsed().as_secs(),
    }))
}

// ========== Collections ==========

async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let collections = state
        .console
        .catalog
        .list_collections()
        .await
        .map_err(|e| ApiError::console("Failed to fetch collections", e))?;
    Ok(Json(json!({ "collections": collections })))
}

#[derive(Debug, Deserialize)]
struct CollectionAction {
    action: String,
}

async fn collection_action(
    State(state): State<AppState>,
    body: Result<Json<CollectionAction>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    if body.action != SEED_ACTION {
        return Err(ApiError::bad_request("Unknown action")
            .with_details(format!("expected \"{SEED_ACTION}\", got \"{}\"", body.action)));
    }

    let outcome = state
        .console
        .mutations
        .create_seed_collection()
        .await
        .map_err(|e| ApiError::console("Failed to create test collection", e))?;

    Ok(Json(json!({
        "success": true,
        "collection": outcome.collection,
        "inserted": outcome.inserted,
    })))
}

fn require_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Collection name is required"));
    }
    Ok(name)
}

/// Query parameters of the object read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub sort_property: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub tenant: Option<String>,
}

/// Resolves the sort directive, enforcing the date-only rule when configured.
fn resolve_sort(
    params: &FetchParams,
    definition: &ClassDefinition,
    require_date: bool,
) -> ApiResult<Option<SortSpec>> {
    let order = match params.sort_order.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse::<SortOrder>()
            .map_err(|e| ApiError::console("Invalid sortOrder", e))?,
        None => SortOrder::Asc,
    };

    let Some(property) = params.sort_property.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if require_date {
        match definition.find_property(property) {
            Some(p) if p.is_date_like() => {}
            Some(_) => {
                return Err(ApiError::bad_request("Invalid sortProperty")
                    .with_details(format!("'{property}' is not a date property")))
            }
            None => {
                return Err(ApiError::bad_request("Invalid sortProperty").with_details(format!(
                    "'{property}' is not a property of '{}'",
                    definition.name
                )))
            }
        }
    }

    Ok(Some(SortSpec::new(property, order)))
}

async fn fetch_collection_data(
    State(state): State<AppState>,
    Path(name): Path<String>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let name = require_name(&name)?;
    let Query(params) = params?;
    let console = &state.console;

    let definition = match console.catalog.describe_collection(name).await {
        Ok(definition) => definition,
        Err(ConsoleError::NotFound { .. }) => {
            return Err(ApiError::not_found("Collection not found"))
        }
        Err(e) => return Err(ApiError::console("Failed to fetch data", e)),
    };

    let page = console
        .queries
        .page(params.limit, params.offset)
        .map_err(|e| ApiError::console("Invalid limit", e))?;
    let sort = resolve_sort(&params, &definition, console.queries.policy().sort_requires_date)?;

    let properties: Vec<String> = definition.properties.iter().map(|p| p.name.clone()).collect();
    let query = ObjectQuery::new(name, &properties, page)
        .sort(sort)
        .tenant(params.tenant.clone());

    let data = console
        .queries
        .run(&query)
        .await
        .map_err(|e| ApiError::console("Failed to fetch data", e))?
        .into_iter()
        .map(|row| row.conform(&definition))
        .collect::<Vec<_>>();

    tracing::debug!(
        target: TRACING_TARGET,
        collection = name,
        rows = data.len(),
        "Served collection data"
    );
    Ok(Json(json!({ "data": data })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    #[serde(default)]
    object_ids: Option<Vec<String>>,
    #[serde(default)]
    delete_collection: bool,
}

async fn delete_from_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let name = require_name(&name)?;
    let Json(body) = body?;
    let mutations = &state.console.mutations;

    if body.delete_collection {
        mutations.delete_collection(name).await.map_err(|e| match e {
            ConsoleError::NotFound { .. } => ApiError::not_found("Collection not found"),
            other => ApiError::console("Failed to delete collection", other),
        })?;
    } else if let Some(ids) = body.object_ids {
        mutations
            .delete_objects(name, &ids)
            .await
            .map_err(|e| ApiError::console("Failed to delete objects", e))?;
    } else {
        return Err(ApiError::bad_request("Either objectIds or deleteCollection is required"));
    }

    Ok(Json(json!({ "success": true })))
}

async fn list_tenants(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let name = require_name(&name)?;
    let tenants = state
        .console
        .catalog
        .list_tenants(name)
        .await
        .map_err(|e| ApiError::console("Failed to fetch tenants", e))?;
    Ok(Json(json!({ "tenants": tenants })))
}

// ========== Connection ==========

async fn connection_status(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.console.store.snapshot();
    Json(json!({
        "url": snapshot.url,
        "connectionId": snapshot.connection_id,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    url: Option<String>,
}

async fn set_connection(
    State(state): State<AppState>,
    body: Result<Json<ConnectRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let url = body
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    let outcome = state.console.clients.connect(&url).await.map_err(|e| match e {
        ConsoleError::Validation(_) => ApiError::console("Invalid URL format", e),
        other => ApiError::gateway("Failed to connect to Weaviate", other),
    })?;

    Ok(Json(json!({
        "success": true,
        "url": outcome.url,
        "connectionId": outcome.connection_id,
        "newConnection": outcome.new_connection,
    })))
}
