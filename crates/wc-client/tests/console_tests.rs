//! Data-access layer tests against the in-memory service.

use chrono::{DateTime, Duration as ChronoDuration};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wc_client::mock::{MockConnector, MockServer};
use wc_client::{Console, VectorService};
use wc_core::{
    ClassDefinition, ConsoleConfig, PageRequest, PropertyInfo, RecordRow, ServerMeta, SortSpec,
    Tenant, Value,
};

const DEFAULT_URL: &str = "http://localhost:8080";

fn article_definition() -> ClassDefinition {
    ClassDefinition::new("Article")
        .description("News articles")
        .property(PropertyInfo::new("title", &["text"]))
        .property(PropertyInfo::new("publishedAt", &["date"]))
        .property(PropertyInfo::new("wordCount", &["int"]))
}

fn tag_definition() -> ClassDefinition {
    ClassDefinition::new("Tag").property(PropertyInfo::new("label", &["text"]))
}

fn articles(n: usize) -> Vec<RecordRow> {
    let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
    (0..n)
        .map(|i| {
            RecordRow::new(format!("article-{i}"))
                .with("title", format!("Article {i}"))
                .with("publishedAt", base + ChronoDuration::hours(i as i64))
                .with("wordCount", (i * 10) as i64)
        })
        .collect()
}

fn tags(n: usize) -> Vec<RecordRow> {
    (0..n)
        .map(|i| RecordRow::new(format!("tag-{i}")).with("label", format!("tag {i}")))
        .collect()
}

fn config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.service.default_url = Some(DEFAULT_URL.into());
    config
}

fn setup(server: MockServer) -> (Console, Arc<MockConnector>) {
    setup_with(server, config())
}

fn setup_with(server: MockServer, config: ConsoleConfig) -> (Console, Arc<MockConnector>) {
    let connector = Arc::new(MockConnector::new());
    connector.register(DEFAULT_URL, server).unwrap();
    let console = Console::new(&config, connector.clone()).unwrap();
    (console, connector)
}

fn props(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Connection Store / Client Manager
// ============================================================

#[test]
fn test_missing_default_url_is_fatal() {
    let connector = Arc::new(MockConnector::new());
    let err = Console::new(&ConsoleConfig::default(), connector).err().unwrap();
    assert_eq!(err.kind(), "configuration_error");
}

#[tokio::test]
async fn test_connect_twice_same_instance() {
    let (console, connector) = setup(MockServer::default());

    let first = console.clients.connect(DEFAULT_URL).await.unwrap();
    assert!(first.new_connection);
    let client_after_first = console.clients.client().unwrap();
    let built = connector.constructions();

    let second = console.clients.connect(DEFAULT_URL).await.unwrap();
    assert!(!second.new_connection);
    assert_eq!(first.connection_id, second.connection_id);
    assert_eq!(connector.constructions(), built);

    let client_after_second = console.clients.client().unwrap();
    assert!(Arc::ptr_eq(&client_after_first, &client_after_second));
    assert_eq!(console.store.connection_id(), Some(first.connection_id));
}

#[tokio::test]
async fn test_connect_normalizes_scheme() {
    let (console, connector) = setup(MockServer::default());
    connector.register("http://localhost:9090", MockServer::new("1.25.0", "other")).unwrap();

    let outcome = console.clients.connect("localhost:9090").await.unwrap();
    assert_eq!(outcome.url, "http://localhost:9090");
    assert_eq!(console.store.url(), "http://localhost:9090");
    assert_eq!(console.clients.client().unwrap().endpoint().url(), "http://localhost:9090");
}

#[tokio::test]
async fn test_connect_to_other_instance_rebinds_client() {
    let (console, connector) = setup(MockServer::default().with_collection(article_definition(), articles(3)));
    connector
        .register("http://replica:8080", MockServer::new("1.24.0", "replica").with_collection(tag_definition(), tags(2)))
        .unwrap();

    console.clients.connect(DEFAULT_URL).await.unwrap();
    let before = console.catalog.collection_names().await.unwrap();
    assert_eq!(before, vec!["Article".to_string()]);

    let switched = console.clients.connect("http://replica:8080").await.unwrap();
    assert!(switched.new_connection);
    let after = console.catalog.collection_names().await.unwrap();
    assert_eq!(after, vec!["Tag".to_string()]);
}

#[tokio::test]
async fn test_restart_with_new_metadata_is_new_connection() {
    let server = MockServer::default();
    let (console, _connector) = setup(server.clone());

    let first = console.clients.connect(DEFAULT_URL).await.unwrap();
    server.set_meta(ServerMeta::new("1.25.0", "mock-node"));
    let second = console.clients.connect(DEFAULT_URL).await.unwrap();

    assert!(second.new_connection);
    assert_ne!(first.connection_id, second.connection_id);
}

#[tokio::test]
async fn test_connect_invalid_url_keeps_state() {
    let (console, _connector) = setup(MockServer::default());
    let before = console.store.snapshot();

    let err = console.clients.connect("ftp://somewhere").await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    let err = console.clients.connect("").await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(console.store.snapshot(), before);
}

#[tokio::test]
async fn test_connect_unreachable_keeps_state() {
    let (console, _connector) = setup(MockServer::default());
    console.clients.connect(DEFAULT_URL).await.unwrap();
    let before = console.store.snapshot();
    let client_before = console.clients.client().unwrap();

    let err = console.clients.connect("http://nowhere:8080").await.unwrap_err();
    assert_eq!(err.kind(), "connectivity_error");
    assert_eq!(console.store.snapshot(), before);
    assert!(Arc::ptr_eq(&client_before, &console.clients.client().unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_connect_probe_times_out() {
    let (console, connector) = setup(MockServer::default());
    let slow = MockServer::new("1.24.0", "slow");
    slow.set_schema_delay(Duration::from_secs(30));
    connector.register("http://slow:8080", slow).unwrap();

    let err = console.clients.connect("http://slow:8080").await.unwrap_err();
    assert_eq!(err.kind(), "connectivity_error");
    assert!(err.to_string().contains("timed out"));
    assert_eq!(console.store.url(), DEFAULT_URL);
    assert_eq!(console.store.connection_id(), None);
}

#[tokio::test]
async fn test_connect_broken_schema_is_connectivity_error() {
    let (console, connector) = setup(MockServer::default());
    let broken = MockServer::default();
    broken.break_schema();
    connector.register("http://broken:8080", broken).unwrap();

    let err = console.clients.connect("http://broken:8080").await.unwrap_err();
    assert_eq!(err.kind(), "connectivity_error");
}

#[test]
fn test_client_is_memoized_per_url() {
    let (console, connector) = setup(MockServer::default());

    let a = console.clients.client().unwrap();
    let b = console.clients.client().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(connector.constructions(), 1);

    console.store.set_url("http://elsewhere:8080");
    let c = console.clients.client().unwrap();
    assert_eq!(c.endpoint().url(), "http://elsewhere:8080");
    assert_eq!(connector.constructions(), 2);
}

#[test]
fn test_failed_construction_keeps_previous_handle() {
    let (console, connector) = setup(MockServer::default());
    let original = console.clients.client().unwrap();

    console.store.set_url("http://elsewhere:8080");
    connector.set_fail_construction(true);
    let err = console.clients.client().err().unwrap();
    assert_eq!(err.kind(), "connectivity_error");

    console.store.set_url(DEFAULT_URL);
    let again = console.clients.client().unwrap();
    assert!(Arc::ptr_eq(&original, &again));
    assert_eq!(connector.constructions(), 1);
}

#[tokio::test]
async fn test_concurrent_reconnects_settle_on_one_state() {
    let (console, connector) = setup(MockServer::default());
    connector.register("http://replica:8080", MockServer::new("1.24.0", "replica")).unwrap();
    let console = Arc::new(console);

    let mut handles = Vec::new();
    for i in 0..8 {
        let console = console.clone();
        let url = if i % 2 == 0 { DEFAULT_URL } else { "http://replica:8080" };
        handles.push(tokio::spawn(async move { console.clients.connect(url).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = console.store.snapshot();
    let client = console.clients.client().unwrap();
    assert_eq!(client.endpoint().url(), state.url);
    assert!(state.connection_id.is_some());
}

// ============================================================
// Schema Catalog
// ============================================================

#[tokio::test]
async fn test_list_collections_degrades_failed_count_to_zero() {
    let server = MockServer::default()
        .with_collection(article_definition(), articles(1200))
        .with_collection(tag_definition(), tags(5));
    server.fail_count_for("Tag");
    let (console, _connector) = setup(server);

    let collections = console.catalog.list_collections().await.unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].name, "Article");
    assert_eq!(collections[0].count, 1200);
    assert_eq!(collections[0].description.as_deref(), Some("News articles"));
    assert_eq!(collections[0].properties.len(), 3);
    assert_eq!(collections[1].name, "Tag");
    assert_eq!(collections[1].count, 0);
}

#[tokio::test]
async fn test_list_collections_preserves_schema_order() {
    let server = MockServer::default();
    let names: Vec<String> = (0..12).map(|i| format!("Coll{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        server.add_collection(ClassDefinition::new(name.as_str()), tags(i));
        if i % 3 == 0 {
            server.fail_count_for(name);
        }
    }
    let (console, _connector) = setup(server);

    let collections = console.catalog.list_collections().await.unwrap();
    let listed: Vec<String> = collections.iter().map(|c| c.name.clone()).collect();
    assert_eq!(listed, names);
    for (i, c) in collections.iter().enumerate() {
        let expected = if i % 3 == 0 { 0 } else { i as u64 };
        assert_eq!(c.count, expected, "collection {}", c.name);
    }
}

#[tokio::test]
async fn test_list_collections_sequential_policy() {
    let mut config = config();
    config.query.count_concurrency = 1;
    let server = MockServer::default()
        .with_collection(article_definition(), articles(4))
        .with_collection(tag_definition(), tags(2));
    let (console, _connector) = setup_with(server, config);

    let counts: Vec<u64> = console
        .catalog
        .list_collections()
        .await
        .unwrap()
        .iter()
        .map(|c| c.count)
        .collect();
    assert_eq!(counts, vec![4, 2]);
}

#[tokio::test]
async fn test_list_collections_schema_failure() {
    let server = MockServer::default().with_collection(tag_definition(), tags(1));
    server.break_schema();
    let (console, _connector) = setup(server);

    let err = console.catalog.list_collections().await.unwrap_err();
    assert_eq!(err.kind(), "schema_error");
}

#[tokio::test]
async fn test_list_collections_unreachable_is_schema_error() {
    let connector = Arc::new(MockConnector::new());
    let console = Console::new(&config(), connector).unwrap();
    let err = console.catalog.list_collections().await.unwrap_err();
    assert_eq!(err.kind(), "schema_error");
}

#[tokio::test]
async fn test_describe_collection() {
    let (console, _connector) = setup(MockServer::default().with_collection(article_definition(), articles(1)));

    let def = console.catalog.describe_collection("Article").await.unwrap();
    assert!(def.find_property("publishedAt").unwrap().is_date_like());

    let err = console.catalog.describe_collection("article").await.unwrap_err();
    assert_eq!(err.kind(), "not_found_error");
}

#[tokio::test]
async fn test_exact_count_propagates_failure() {
    let server = MockServer::default().with_collection(tag_definition(), tags(3));
    let (console, _connector) = setup(server.clone());
    assert_eq!(console.catalog.count("Tag", None).await.unwrap(), 3);

    server.fail_count_for("Tag");
    assert!(console.catalog.count("Tag", None).await.is_err());
}

#[tokio::test]
async fn test_list_tenants() {
    let server = MockServer::default().with_collection(article_definition(), Vec::new());
    server.set_tenants(
        "Article",
        vec![
            Tenant { name: "acme".into(), activity_status: Some("HOT".into()) },
            Tenant { name: "globex".into(), activity_status: None },
        ],
    );
    let (console, _connector) = setup(server);

    let tenants = console.catalog.list_tenants("Article").await.unwrap();
    let names: Vec<&str> = tenants.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["acme", "globex"]);

    let err = console.catalog.list_tenants("bad name").await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
}

// ============================================================
// Query Executor
// ============================================================

#[tokio::test]
async fn test_list_objects_sorted_desc() {
    let (console, _connector) = setup(MockServer::default().with_collection(article_definition(), articles(1200)));

    let rows = console
        .queries
        .list_objects(
            "Article",
            &props(&["title", "publishedAt"]),
            Some(SortSpec::desc("publishedAt")),
            PageRequest::new(50, 0),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 50);
    assert_eq!(rows[0].identity, "article-1199");
    for row in &rows {
        assert!(row.get("title").is_some());
        assert!(row.get("publishedAt").is_some());
        assert!(row.get("wordCount").is_none());
        assert!(!row.identity.is_empty());
    }
    for pair in rows.windows(2) {
        let a = pair[0].get("publishedAt").and_then(Value::as_datetime).unwrap();
        let b = pair[1].get("publishedAt").and_then(Value::as_datetime).unwrap();
        assert!(a > b);
    }
}

#[tokio::test]
async fn test_paging_walks_all_rows() {
    let (console, _connector) = setup(MockServer::default().with_collection(article_definition(), articles(120)));

    let mut page = PageRequest::first(50);
    let mut seen = HashSet::new();
    let mut sizes = Vec::new();
    loop {
        let rows = console
            .queries
            .list_objects("Article", &props(&["title"]), Some(SortSpec::asc("publishedAt")), page)
            .await
            .unwrap();
        assert!(rows.len() <= page.limit);
        sizes.push(rows.len());
        for row in &rows {
            assert!(seen.insert(row.identity.clone()));
        }
        if !page.has_more(rows.len()) {
            break;
        }
        page = page.next(rows.len());
    }

    assert_eq!(sizes, vec![50, 50, 20]);
    assert_eq!(seen.len(), 120);
}

#[tokio::test]
async fn test_exact_multiple_needs_one_empty_page() {
    let (console, _connector) = setup(MockServer::default().with_collection(tag_definition(), tags(100)));

    let first = console
        .queries
        .list_objects("Tag", &props(&["label"]), None, PageRequest::first(100))
        .await
        .unwrap();
    assert!(PageRequest::first(100).has_more(first.len()));

    let second = console
        .queries
        .list_objects("Tag", &props(&["label"]), None, PageRequest::new(100, 100))
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_sort_is_passed_through_unchecked() {
    let (console, _connector) = setup(MockServer::default().with_collection(article_definition(), articles(5)));

    let by_title = console
        .queries
        .list_objects("Article", &props(&["title"]), Some(SortSpec::desc("title")), PageRequest::first(5))
        .await
        .unwrap();
    assert_eq!(by_title[0].get("title"), Some(&Value::Text("Article 4".into())));

    let err = console
        .queries
        .list_objects("Article", &props(&["title"]), Some(SortSpec::asc("missing")), PageRequest::first(5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "query_error");
}

#[tokio::test]
async fn test_limit_bounds() {
    let (console, _connector) = setup(MockServer::default().with_collection(tag_definition(), tags(3)));

    for limit in [0, 251] {
        let err = console
            .queries
            .list_objects("Tag", &props(&["label"]), None, PageRequest::first(limit))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    assert_eq!(console.queries.page(None, None).unwrap(), PageRequest::new(100, 0));
    assert_eq!(console.queries.page(Some(250), Some(500)).unwrap(), PageRequest::new(250, 500));
    assert!(console.queries.page(Some(1000), None).is_err());
}

#[tokio::test]
async fn test_unknown_collection_is_query_error() {
    let (console, _connector) = setup(MockServer::default());
    let err = console
        .queries
        .list_objects("Missing", &props(&["x"]), None, PageRequest::first(10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "query_error");
}

#[tokio::test]
async fn test_invalid_names_never_reach_service() {
    let server = MockServer::default().with_collection(tag_definition(), tags(1));
    let (console, _connector) = setup(server.clone());

    let err = console
        .queries
        .list_objects("Tag) { x }", &props(&["label"]), None, PageRequest::first(10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(server.queries(), 0);
}

// ============================================================
// Mutation Ops
// ============================================================

#[tokio::test]
async fn test_delete_objects_empty_is_noop() {
    let server = MockServer::default().with_collection(tag_definition(), tags(3));
    let (console, _connector) = setup(server.clone());

    console.mutations.delete_objects("Tag", &[]).await.unwrap();
    assert_eq!(server.mutations(), 0);
    assert_eq!(server.object_count("Tag"), Some(3));
}

#[tokio::test]
async fn test_delete_objects_ignores_unknown_ids() {
    let server = MockServer::default().with_collection(tag_definition(), tags(3));
    let (console, _connector) = setup(server.clone());

    console
        .mutations
        .delete_objects("Tag", &props(&["tag-0", "tag-2", "tag-2", "no-such-id"]))
        .await
        .unwrap();
    assert_eq!(server.mutations(), 1);
    assert_eq!(server.object_count("Tag"), Some(1));
}

#[tokio::test]
async fn test_delete_collection_not_found() {
    let server = MockServer::default()
        .with_collection(article_definition(), articles(2))
        .with_collection(tag_definition(), tags(2));
    let (console, _connector) = setup(server.clone());

    let err = console.mutations.delete_collection("Ghost").await.unwrap_err();
    assert_eq!(err.kind(), "not_found_error");
    assert_eq!(server.mutations(), 0);
    assert_eq!(server.collection_names(), vec!["Article".to_string(), "Tag".to_string()]);
}

#[tokio::test]
async fn test_delete_collection() {
    let server = MockServer::default()
        .with_collection(article_definition(), articles(2))
        .with_collection(tag_definition(), tags(2));
    let (console, _connector) = setup(server.clone());

    console.mutations.delete_collection("Tag").await.unwrap();
    assert_eq!(server.collection_names(), vec!["Article".to_string()]);
    assert_eq!(server.object_count("Article"), Some(2));
}

#[tokio::test]
async fn test_seed_collection_created_once() {
    let server = MockServer::default();
    let (console, _connector) = setup(server.clone());

    let outcome = console.mutations.create_seed_collection().await.unwrap();
    assert_eq!(outcome.collection, "TestCollection");
    assert_eq!(outcome.inserted, 3);
    assert_eq!(server.object_count("TestCollection"), Some(3));
    let mutations = server.mutations();

    let err = console.mutations.create_seed_collection().await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert!(err.to_string().contains("already exists"));
    assert_eq!(server.mutations(), mutations);
    assert_eq!(server.object_count("TestCollection"), Some(3));
}

#[tokio::test]
async fn test_seed_collection_is_browsable() {
    let (console, _connector) = setup(MockServer::default());
    console.mutations.create_seed_collection().await.unwrap();

    let info = console.catalog.list_collections().await.unwrap();
    assert_eq!(info[0].count, 3);

    let def = console.catalog.describe_collection("TestCollection").await.unwrap();
    let names: Vec<String> = def.properties.iter().map(|p| p.name.clone()).collect();
    let rows = console
        .queries
        .list_objects("TestCollection", &names, Some(SortSpec::asc("publishedAt")), PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].get("title"),
        Some(&Value::Text("Getting started with vector search".into()))
    );
}
