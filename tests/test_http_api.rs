//! HTTP surface: router served in-process on an ephemeral port, stores in memory.

use migration_dual_read::storage::{InMemoryKeyValueStore, InMemoryRelationalStore};
use migration_dual_read::transport::http::{create_router, AppState};
use migration_dual_read::{MigrationConfig, Phase, Settings, StoreClients};
use serde_json::{json, Value};
use std::sync::Arc;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    migration: Arc<MigrationConfig>,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn_server(phase: Phase, allow_phase_override: bool) -> Result<TestServer, Box<dyn std::error::Error>> {
    let profile = json!({"PK": "USER#u1", "SK": "PROFILE", "id": "u1", "email": "ada@example.com"});
    let supabase = Arc::new(InMemoryRelationalStore::new());
    supabase.insert("profiles", profile.clone()).await;
    let dynamodb = Arc::new(InMemoryKeyValueStore::new());
    dynamodb.put(profile).await?;

    let settings = Settings {
        allow_phase_override,
        ..Settings::default()
    };
    let migration = Arc::new(MigrationConfig::with_phase(phase, settings));
    let state = AppState::new(migration.clone(), StoreClients::new(Some(supabase), Some(dynamodb)));
    let router = create_router(state);

    // Bind to an ephemeral port to avoid conflicts with a running API server.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        migration,
        handle,
    })
}

#[tokio::test]
async fn health_endpoints_answer_with_cors_headers() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn_server(Phase::DualRead, false).await?;

    let res = server
        .client
        .get(format!("{}/health", server.base_url))
        .header("Origin", "http://dashboard.local")
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");

    let res = server
        .client
        .get(format!("{}/migration/health", server.base_url))
        .header("Origin", "http://dashboard.local")
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("access-control-allow-origin"));
    let body: Value = res.json().await?;
    assert_eq!(body["migration"]["phase"], "dual-read");
    assert_eq!(body["migration"]["primarySource"], "supabase");
    assert_eq!(body["dataSources"]["supabase"]["available"], true);
    assert_eq!(body["dataSources"]["dynamodb"]["available"], true);
    assert!(body["dataSources"]["supabase"]["responseTime"].is_u64());
    assert!(body["recommendations"].is_array());
    Ok(())
}

#[tokio::test]
async fn migration_health_reports_a_missing_client() -> Result<(), Box<dyn std::error::Error>> {
    let migration = Arc::new(MigrationConfig::with_phase(Phase::PreMigration, Settings::default()));
    let router = create_router(AppState::new(migration, StoreClients::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/migration/health", port))
        .await?
        .json()
        .await?;
    assert_eq!(body["dataSources"]["supabase"]["available"], false);
    assert_eq!(body["dataSources"]["supabase"]["error"], "Client not initialized");
    assert_eq!(body["dataSources"]["supabase"]["responseTime"], 0);
    assert_eq!(body["dataSources"]["dynamodb"]["error"], "Client not initialized");

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn phase_override_is_gated() -> Result<(), Box<dyn std::error::Error>> {
    let locked = spawn_server(Phase::PreMigration, false).await?;
    let res = locked
        .client
        .post(format!("{}/migration/phase", locked.base_url))
        .json(&json!({"phase": "dual-read", "confirm": true}))
        .send()
        .await?;
    assert_eq!(res.status(), 403);
    assert_eq!(locked.migration.current_phase().phase, Phase::PreMigration);

    let open = spawn_server(Phase::PreMigration, true).await?;
    let url = format!("{}/migration/phase", open.base_url);

    let res = open.client.post(&url).json(&json!({"phase": "dual-read"})).send().await?;
    assert_eq!(res.status(), 400);
    assert_eq!(open.migration.current_phase().phase, Phase::PreMigration);

    let res = open
        .client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), 422);

    let res = open
        .client
        .post(&url)
        .json(&json!({"phase": "dual-write", "confirm": true}))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["applied"]["phase"], "dual-write");
    assert_eq!(body["data"]["applied"]["writeToDynamoDB"], true);
    assert!(body["data"].get("warning").is_none());

    let status: Value = open
        .client
        .get(format!("{}/migration/status", open.base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(status["phase"], "dual-write");
    assert_eq!(status["fallbackEnabled"], true);

    let res = open
        .client
        .post(&url)
        .json(&json!({"phase": "halfway", "confirm": true}))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["applied"]["phase"], "pre-migration");
    assert_eq!(
        body["data"]["warning"],
        "Unknown migration phase: halfway, defaulting to pre-migration"
    );
    Ok(())
}

#[tokio::test]
async fn dual_read_endpoint_returns_both_sides() -> Result<(), Box<dyn std::error::Error>> {
    let server = spawn_server(Phase::DualRead, false).await?;

    let res = server
        .client
        .post(format!("{}/api/dual-read/profiles", server.base_url))
        .json(&json!({"id": "u1", "single": true}))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["primary"]["source"], "supabase");
    assert_eq!(body["primary"]["data"]["email"], "ada@example.com");
    assert_eq!(body["fallback"]["source"], "dynamodb");
    assert_eq!(body["comparison"]["match"], true);
    assert_eq!(body["comparison"]["differences"], json!([]));

    // Unknown tables are a per-source error, not an HTTP failure.
    let res = server
        .client
        .post(format!("{}/api/dual-read/ledgers", server.base_url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert!(body["primary"]["error"]
        .as_str()
        .is_some_and(|e| e.contains("does not exist")));

    let res = server
        .client
        .post(format!("{}/api/dual-read/1profiles", server.base_url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), 400);
    Ok(())
}
