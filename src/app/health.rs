//! Migration health report: phase snapshot, store reachability and operator hints.

use crate::app::dual_read_service::DualReadService;
use crate::domain::migration::{MigrationConfig, MigrationStatus};
use crate::domain::recommendations::generate_recommendations;
use crate::domain::result::HealthReport;
use crate::storage::StoreClients;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationHealth {
    pub migration: MigrationStatus,
    pub data_sources: HealthReport,
    pub recommendations: Vec<String>,
}

/// Checks both stores under the current phase policy and assembles the report.
pub async fn migration_health(config: &MigrationConfig, clients: StoreClients) -> MigrationHealth {
    let service = DualReadService::with_clients(config.dual_read_policy(), clients);
    let data_sources = service.health_check().await;
    let migration = config.migration_status();
    let recommendations = generate_recommendations(&data_sources, &migration);

    if !recommendations.is_empty() {
        tracing::info!(phase = %migration.phase, ?recommendations, "Migration health recommendations");
    }

    MigrationHealth {
        migration,
        data_sources,
        recommendations,
    }
}
