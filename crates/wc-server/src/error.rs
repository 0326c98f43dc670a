//! JSON error responses for the HTTP API.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wc_core::ConsoleError;

pub const TRACING_TARGET: &str = "wc_server::error";

/// API error rendered as `{error, details, kind}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, error: impl Into<String>) -> Self {
        Self { status, kind, error: error.into(), details: None }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found_error", msg)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Wraps a console error under a route-level summary.
    ///
    /// Validation maps to 400, not-found to 404, everything else to 500.
    pub fn console(summary: impl Into<String>, err: ConsoleError) -> Self {
        let status = match &err {
            ConsoleError::Validation(_) => StatusCode::BAD_REQUEST,
            ConsoleError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), summary).with_details(err.to_string())
    }

    /// Like [`ApiError::console`], but an unreachable service is a 502.
    pub fn gateway(summary: impl Into<String>, err: ConsoleError) -> Self {
        match err {
            ConsoleError::Connectivity(_) => {
                let kind = err.kind();
                Self::new(StatusCode::BAD_GATEWAY, kind, summary).with_details(err.to_string())
            }
            other => Self::console(summary, other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                target: TRACING_TARGET,
                status = self.status.as_u16(),
                kind = self.kind,
                details = self.details.as_deref().unwrap_or(""),
                "{}",
                self.error
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET,
                status = self.status.as_u16(),
                kind = self.kind,
                "{}",
                self.error
            );
        }

        let body = json!({
            "error": self.error,
            "details": self.details,
            "kind": self.kind,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Invalid query parameters").with_details(rejection.body_text())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
