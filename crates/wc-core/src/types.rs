use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConsoleError;
use crate::value::Value;

/// A typed field declared on a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type tags; the first one drives rendering and sort eligibility.
    #[serde(default)]
    pub data_type: Vec<String>,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, data_type: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            data_type: data_type.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.data_type.first().map(String::as_str)
    }

    /// True when any type tag is `date` or a date array.
    pub fn is_date_like(&self) -> bool {
        self.data_type.iter().any(|t| t.to_ascii_lowercase().starts_with("date"))
    }
}

/// A collection as shown in the overview: schema plus best-effort count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub count: u64,
    pub properties: Vec<PropertyInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTenancyConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// A collection definition as held in the service's schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    #[serde(rename = "class")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_tenancy_config: Option<MultiTenancyConfig>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            properties: Vec::new(),
            multi_tenancy_config: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn into_info(self, count: u64) -> CollectionInfo {
        CollectionInfo {
            name: self.name,
            description: self.description,
            count,
            properties: self.properties,
        }
    }
}

/// One stored object: business properties plus the service-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub identity: String,
    pub properties: BTreeMap<String, Value>,
}

impl RecordRow {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Keeps date values only on properties the schema declares as dates.
    ///
    /// Text that merely looks like a timestamp is turned back into text.
    pub fn conform(mut self, definition: &ClassDefinition) -> Self {
        for (name, value) in self.properties.iter_mut() {
            let is_date = definition.find_property(name).is_some_and(PropertyInfo::is_date_like);
            if !is_date {
                *value = std::mem::take(value).into_text();
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ConsoleError::validation(format!(
                "sort order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub property: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(property: impl Into<String>, order: SortOrder) -> Self {
        Self { property: property.into(), order }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, SortOrder::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, SortOrder::Desc)
    }
}

/// A limit/offset window. Callers advance `offset` by the rows they received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: usize) -> Self {
        Self::new(limit, 0)
    }

    /// The window following one that returned `returned` rows.
    pub fn next(&self, returned: usize) -> Self {
        Self::new(self.limit, self.offset + returned)
    }

    /// More data may follow only when the window came back full.
    pub fn has_more(&self, returned: usize) -> bool {
        returned == self.limit
    }
}

/// Identity of a running service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMeta {
    #[serde(default = "unknown", deserialize_with = "or_unknown")]
    pub version: String,
    #[serde(default = "unknown", deserialize_with = "or_unknown")]
    pub hostname: String,
}

fn unknown() -> String {
    "unknown".into()
}

/// Null and blank strings read as "unknown".
fn or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).unwrap_or_else(unknown))
}

impl ServerMeta {
    pub fn new(version: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self { version: version.into(), hostname: hostname.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_status: Option<String>,
}
