use crate::app::dual_read_service::DualReadService;
use crate::domain::entity::{EntityQuery, EntityType};
use crate::storage::supabase::validate_ident;
use crate::transport::http::handlers::common::{bad_request, json_422};
use crate::transport::http::types::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/dual-read/{entity}",
    params(
        ("entity" = String, Path, description = "Entity type (e.g. profiles, accounts, transactions)")
    ),
    request_body = EntityQuery,
    responses(
        (status = 200, description = "Dual-read outcome, including per-source errors", body = DualReadResult),
        (status = 400, description = "Bad request", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn dual_read_handler(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    request: Result<Json<EntityQuery>, JsonRejection>,
) -> impl IntoResponse {
    let entity_name = entity.trim().to_lowercase();
    if !validate_ident(&entity_name) {
        return bad_request(format!("Invalid entity type '{}'", entity_name)).into_response();
    }

    let Json(query) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, r#"{"id": "...", "userId": "...", "single": true}"#).into_response()
        }
    };

    let service = DualReadService::with_clients(state.migration.dual_read_policy(), state.clients.clone());
    let result = service.dual_read(EntityType::parse(&entity_name), query).await;

    (StatusCode::OK, Json(result)).into_response()
}
