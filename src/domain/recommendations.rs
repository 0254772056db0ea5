//! Operator hints derived from a health report and the current migration status.

use crate::domain::migration::{MigrationStatus, Phase};
use crate::domain::result::HealthReport;
use crate::domain::source::DataSource;

/// Response time above which a store is flagged as slow.
pub const SLOW_RESPONSE_MS: u64 = 1_000;

pub fn generate_recommendations(health: &HealthReport, status: &MigrationStatus) -> Vec<String> {
    let mut recommendations = Vec::new();

    if !health.supabase.available && status.primary_source == DataSource::Supabase {
        recommendations.push(
            "Primary source (Supabase) is unavailable. Consider enabling fallback or switching to DynamoDB."
                .to_string(),
        );
    }

    if !health.dynamodb.available && status.primary_source == DataSource::DynamoDb {
        recommendations.push(
            "Primary source (DynamoDB) is unavailable. Consider switching back to Supabase.".to_string(),
        );
    }

    if health.supabase.response_time > SLOW_RESPONSE_MS {
        recommendations.push("Supabase response time is high (>1s). Monitor performance.".to_string());
    }

    if health.dynamodb.response_time > SLOW_RESPONSE_MS {
        recommendations.push("DynamoDB response time is high (>1s). Check configuration.".to_string());
    }

    match status.phase {
        Phase::PreMigration if health.dynamodb.available => {
            recommendations
                .push("DynamoDB is available. Consider moving to dual-read phase.".to_string());
        }
        Phase::DualRead if !status.comparison_mode => {
            recommendations.push("Enable comparison mode to validate data consistency.".to_string());
        }
        Phase::DualWrite if health.supabase.available && health.dynamodb.available => {
            recommendations.push(
                "Both sources are healthy. Consider moving to post-migration phase.".to_string(),
            );
        }
        _ => {}
    }

    recommendations
}
