// src/bin/api_server.rs

use migration_dual_read::infra::logging::init_tracing;
use migration_dual_read::transport;
use migration_dual_read::{MigrationConfig, Settings, StoreClients};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();

    // --- Configuration ---
    let settings = Settings::from_env();
    let bind_addr = settings.bind_addr();
    let migration = Arc::new(MigrationConfig::new(settings));
    let status = migration.migration_status();
    tracing::info!(
        phase = %status.phase,
        primary = %status.primary_source,
        fallback = status.fallback_enabled,
        comparison = status.comparison_mode,
        "Migration configuration initialized"
    );

    // --- Store clients (built once, no I/O until first read) ---
    let clients = StoreClients::from_config(&migration.dual_read_policy()).await?;
    tracing::info!(
        supabase = clients.supabase.is_some(),
        dynamodb = clients.dynamodb.is_some(),
        "Store clients initialized"
    );

    // --- API Server Initialization ---
    let app_state = transport::http::AppState::new(migration, clients);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("API server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", bind_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received (Ctrl+C)");
        }
    }

    Ok(())
}
