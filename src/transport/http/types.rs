use crate::domain::migration::MigrationConfig;
use crate::storage::StoreClients;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared by every handler. Store clients are built once; the phase policy is read per request.
#[derive(Clone)]
pub struct AppState {
    pub migration: Arc<MigrationConfig>,
    pub clients: StoreClients,
}

impl AppState {
    pub fn new(migration: Arc<MigrationConfig>, clients: StoreClients) -> Self {
        Self { migration, clients }
    }

    /// Phase changes over HTTP are opt-in (`ALLOW_PHASE_OVERRIDE=true`).
    pub fn phase_override_allowed(&self) -> bool {
        self.migration.settings().allow_phase_override
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Body of a failed migration health check.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthCheckError {
    pub error: String,
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct SetPhaseRequest {
    /// One of `pre-migration`, `dual-read`, `dual-write`, `post-migration`.
    /// Anything else applies `pre-migration`.
    pub phase: String,
    /// Safety switch to prevent accidental phase changes.
    #[serde(default)]
    pub confirm: bool,
}
