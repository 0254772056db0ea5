use crate::app::health::MigrationHealth;
use crate::domain::entity::EntityQuery;
use crate::domain::migration::{MigrationPhase, MigrationStatus, Phase};
use crate::domain::result::{Comparison, DataSourceResult, DualReadResult, HealthReport, SourceHealth};
use crate::domain::source::DataSource;
use crate::transport::http::handlers::{dual_read, health, migration};
use crate::transport::http::types::{ApiResponse, AppState, HealthCheckError, SetPhaseRequest};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        migration::migration_health_handler,
        migration::migration_status_handler,
        migration::set_phase_handler,
        dual_read::dual_read_handler
    ),
    components(schemas(
        ApiResponse,
        HealthCheckError,
        SetPhaseRequest,
        MigrationHealth,
        MigrationStatus,
        MigrationPhase,
        Phase,
        DataSource,
        HealthReport,
        SourceHealth,
        EntityQuery,
        DualReadResult,
        DataSourceResult,
        Comparison
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    // Browser clients read the health report directly.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/migration/health", get(migration::migration_health_handler))
        .route("/migration/status", get(migration::migration_status_handler))
        .route("/migration/phase", post(migration::set_phase_handler))
        .route("/api/dual-read/:entity", post(dual_read::dual_read_handler))
        .layer(cors)
        .with_state(app_state)
}
