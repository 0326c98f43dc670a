//! Read query construction and execution: field selection, sorting and
//! limit/offset paging over one collection.

use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use wc_core::{ConsoleError, PageRequest, QueryPolicy, RecordRow, Result, SortSpec};

use crate::manager::ClientManager;

pub const TRACING_TARGET: &str = "wc_client::query";

/// Name of the metadata selection that carries the object identity.
pub const ADDITIONAL_FIELD: &str = "_additional";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name pattern"))
}

/// Rejects names that cannot be spliced into query text verbatim.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(ConsoleError::validation(format!("invalid {kind} name '{name}'")))
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// A read over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectQuery {
    pub collection: String,
    /// Exactly the properties to return; the identity is always added.
    pub properties: Vec<String>,
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
    pub tenant: Option<String>,
}

impl ObjectQuery {
    pub fn new(collection: impl Into<String>, properties: &[String], page: PageRequest) -> Self {
        let mut seen = HashSet::new();
        let properties = properties
            .iter()
            .filter(|p| p.as_str() != ADDITIONAL_FIELD && seen.insert(p.as_str()))
            .cloned()
            .collect();
        Self {
            collection: collection.into(),
            properties,
            sort: None,
            page,
            tenant: None,
        }
    }

    pub fn sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant.filter(|t| !t.is_empty());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("collection", &self.collection)?;
        for p in &self.properties {
            validate_name("property", p)?;
        }
        if let Some(sort) = &self.sort {
            validate_name("sort property", &sort.property)?;
        }
        if self.page.limit == 0 {
            return Err(ConsoleError::validation("limit must be at least 1"));
        }
        Ok(())
    }

    /// Renders the GraphQL `Get` query text.
    pub fn to_graphql(&self) -> String {
        let mut args = vec![
            format!("limit: {}", self.page.limit),
            format!("offset: {}", self.page.offset),
        ];
        if let Some(sort) = &self.sort {
            args.push(format!(
                "sort: [{{path: [{}], order: {}}}]",
                quote(&sort.property),
                sort.order
            ));
        }
        if let Some(tenant) = &self.tenant {
            args.push(format!("tenant: {}", quote(tenant)));
        }

        let mut fields: Vec<&str> = self.properties.iter().map(String::as_str).collect();
        fields.push("_additional { id }");

        format!(
            "{{ Get {{ {}({}) {{ {} }} }} }}",
            self.collection,
            args.join(", "),
            fields.join(" ")
        )
    }
}

/// An object count over one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateQuery {
    pub collection: String,
    pub tenant: Option<String>,
}

impl AggregateQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), tenant: None }
    }

    pub fn tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant.filter(|t| !t.is_empty());
        self
    }

    /// Renders the GraphQL `Aggregate` query text.
    pub fn to_graphql(&self) -> String {
        let target = match &self.tenant {
            Some(t) => format!("{}(tenant: {})", self.collection, quote(t)),
            None => self.collection.clone(),
        };
        format!("{{ Aggregate {{ {target} {{ meta {{ count }} }} }} }}")
    }
}

/// Issues paged reads against the active client.
pub struct QueryExecutor {
    clients: Arc<ClientManager>,
    policy: QueryPolicy,
}

impl QueryExecutor {
    pub fn new(clients: Arc<ClientManager>, policy: QueryPolicy) -> Self {
        Self { clients, policy }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Resolves an optional limit/offset pair against the paging policy.
    pub fn page(&self, limit: Option<usize>, offset: Option<usize>) -> Result<PageRequest> {
        let limit = limit.unwrap_or(self.policy.default_limit);
        self.check_limit(limit)?;
        Ok(PageRequest::new(limit, offset.unwrap_or(0)))
    }

    fn check_limit(&self, limit: usize) -> Result<()> {
        if limit == 0 || limit > self.policy.max_limit {
            return Err(ConsoleError::validation(format!(
                "limit must be between 1 and {}, got {limit}",
                self.policy.max_limit
            )));
        }
        Ok(())
    }

    /// Reads one page of objects.
    ///
    /// The sort directive is passed through as given; a rejection by the
    /// service surfaces as a query error. Fewer than `page.limit` rows means
    /// the end of the data was reached.
    pub async fn list_objects(
        &self,
        collection: &str,
        properties: &[String],
        sort: Option<SortSpec>,
        page: PageRequest,
    ) -> Result<Vec<RecordRow>> {
        let query = ObjectQuery::new(collection, properties, page).sort(sort);
        self.run(&query).await
    }

    pub async fn run(&self, query: &ObjectQuery) -> Result<Vec<RecordRow>> {
        query.validate()?;
        self.check_limit(query.page.limit)?;

        let client = self.clients.client()?;
        let mut rows = client.fetch_objects(query).await?;
        rows.truncate(query.page.limit);

        tracing::debug!(
            target: TRACING_TARGET,
            collection = %query.collection,
            limit = query.page.limit,
            offset = query.page.offset,
            sorted = query.sort.is_some(),
            returned = rows.len(),
            "Fetched objects"
        );
        Ok(rows)
    }
}
