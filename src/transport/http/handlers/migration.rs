use crate::app::health::migration_health;
use crate::transport::http::handlers::common::{bad_request, json_422};
use crate::transport::http::types::{ApiResponse, AppState, HealthCheckError, SetPhaseRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/migration/health",
    responses(
        (status = 200, description = "Health report (also when a store is degraded)", body = MigrationHealth),
        (status = 500, description = "Health check failed unexpectedly", body = HealthCheckError)
    )
)]
pub async fn migration_health_handler(State(state): State<AppState>) -> impl IntoResponse {
    // Run on its own task so a panic deep in a store client still yields a response.
    let task = tokio::spawn(async move { migration_health(&state.migration, state.clients.clone()).await });

    match task.await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthCheckError {
                    error: "Health check failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/migration/status",
    responses(
        (status = 200, description = "Current migration phase snapshot", body = MigrationStatus)
    )
)]
pub async fn migration_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.migration.migration_status()))
}

#[utoipa::path(
    post,
    path = "/migration/phase",
    request_body = SetPhaseRequest,
    responses(
        (status = 200, description = "Phase applied", body = ApiResponse),
        (status = 400, description = "Missing confirmation", body = ApiResponse),
        (status = 403, description = "Phase override disabled", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn set_phase_handler(
    State(state): State<AppState>,
    request: Result<Json<SetPhaseRequest>, JsonRejection>,
) -> impl IntoResponse {
    if !state.phase_override_allowed() {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::err(
                "Phase override is disabled (set ALLOW_PHASE_OVERRIDE=true)",
            )),
        )
            .into_response();
    }

    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, r#"{"phase": "dual-read", "confirm": true}"#).into_response(),
    };

    if !request.confirm {
        return bad_request("Refusing to change migration phase without confirm=true").into_response();
    }

    let (applied, recognised) = state.migration.set_phase_label(&request.phase);
    let mut data = serde_json::json!({
        "requested": request.phase,
        "applied": applied,
    });
    if !recognised {
        data["warning"] = serde_json::json!(format!(
            "Unknown migration phase: {}, defaulting to pre-migration",
            request.phase
        ));
    }

    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}
