use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Connectivity error: {0}")]
    Connectivity(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Collection not found: {name}")]
    NotFound { name: String },
    #[error("Query error: {0}")]
    Query(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConsoleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Stable kind tag carried in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Validation(_) => "validation_error",
            Self::Connectivity(_) => "connectivity_error",
            Self::Schema(_) => "schema_error",
            Self::NotFound { .. } => "not_found_error",
            Self::Query(_) => "query_error",
            Self::Serialization(_) => "serialization_error",
            Self::Other(_) => "internal_error",
        }
    }

    /// Re-labels a connectivity or query failure as a schema failure.
    ///
    /// Used where a failed fetch of the schema document fails the whole call.
    pub fn into_schema(self) -> Self {
        match self {
            Self::Connectivity(msg) | Self::Query(msg) => Self::Schema(msg),
            Self::Serialization(err) => Self::Schema(err.to_string()),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
