//! Decoding of GraphQL and batch responses.

use serde_json::Value as Json;
use wc_core::{ConsoleError, RecordRow, Result, Value};

use crate::query::ADDITIONAL_FIELD;
use crate::traits::BatchOutcome;

fn graphql_errors(body: &Json) -> Option<String> {
    let errors = body.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Json::as_str).unwrap_or("unknown error"))
        .collect();
    Some(messages.join("; "))
}

/// Extracts rows from `{data: {Get: {<collection>: [...]}}}`.
pub fn parse_get_response(collection: &str, body: Json) -> Result<Vec<RecordRow>> {
    if let Some(msg) = graphql_errors(&body) {
        return Err(ConsoleError::query(msg));
    }

    let objects = body
        .get("data")
        .and_then(|d| d.get("Get"))
        .ok_or_else(|| ConsoleError::query("Invalid response structure: missing data.Get"))?
        .get(collection)
        .cloned()
        .unwrap_or(Json::Null);

    let objects = match objects {
        Json::Null => return Ok(Vec::new()),
        Json::Array(items) => items,
        other => {
            return Err(ConsoleError::query(format!(
                "Invalid response structure: expected a list for {collection}, got {other}"
            )))
        }
    };

    objects.into_iter().map(into_row).collect()
}

fn into_row(object: Json) -> Result<RecordRow> {
    let Json::Object(mut map) = object else {
        return Err(ConsoleError::query("Invalid response structure: object is not a map"));
    };

    let identity = map
        .remove(ADDITIONAL_FIELD)
        .and_then(|extra| extra.get("id").and_then(Json::as_str).map(str::to_string))
        .ok_or_else(|| ConsoleError::query("Invalid response structure: object without id"))?;

    let mut row = RecordRow::new(identity);
    for (key, value) in map {
        row.properties.insert(key, Value::from(value));
    }
    Ok(row)
}

/// Extracts the count from `{data: {Aggregate: {<collection>: [{meta: {count}}]}}}`.
///
/// An absent count reads as zero.
pub fn parse_aggregate_response(collection: &str, body: &Json) -> Result<u64> {
    if let Some(msg) = graphql_errors(body) {
        return Err(ConsoleError::query(msg));
    }

    let aggregate = body
        .get("data")
        .and_then(|d| d.get("Aggregate"))
        .ok_or_else(|| ConsoleError::query("Invalid response structure: missing data.Aggregate"))?;

    Ok(aggregate
        .get(collection)
        .and_then(|groups| groups.get(0))
        .and_then(|g| g.get("meta"))
        .and_then(|m| m.get("count"))
        .and_then(Json::as_u64)
        .unwrap_or(0))
}

/// Reads `{results: {successful, failed}}` from a batch delete.
pub fn parse_delete_response(body: &Json) -> BatchOutcome {
    let results = body.get("results");
    let field = |name: &str| {
        results
            .and_then(|r| r.get(name))
            .and_then(Json::as_u64)
            .unwrap_or(0) as usize
    };
    BatchOutcome {
        succeeded: field("successful"),
        failed: field("failed"),
    }
}

/// Tallies per-object `result.errors` from a batch insert.
pub fn parse_insert_response(body: &Json) -> BatchOutcome {
    let Some(items) = body.as_array() else {
        return BatchOutcome::default();
    };
    let failed = items
        .iter()
        .filter(|item| {
            item.get("result")
                .and_then(|r| r.get("errors"))
                .map_or(false, |e| !e.is_null())
        })
        .count();
    BatchOutcome {
        succeeded: items.len() - failed,
        failed,
    }
}
