pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{ConsoleConfig, QueryPolicy, SeedConfig, ServerConfig, ServiceConfig};
pub use error::{ConsoleError, Result};
pub use types::{
    ClassDefinition, CollectionInfo, MultiTenancyConfig, PageRequest, PropertyInfo, RecordRow,
    ServerMeta, SortOrder, SortSpec, Tenant,
};
pub use value::{Timestamp, Value};
