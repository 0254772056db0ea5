//! Process-wide migration phase state.
//!
//! One `MigrationConfig` is built in the composition root and shared behind an `Arc`.
//! The phase record is swapped whole under a write lock; readers copy it out whole.

use crate::domain::migration::phase::{MigrationPhase, Phase};
use crate::domain::source::DataSource;
use crate::infra::config::{ComparisonStrategy, Settings};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;
use std::time::Duration;
use utoipa::ToSchema;

/// Everything the dual-read coordinator needs: read policy plus store connection parameters.
#[derive(Debug, Clone)]
pub struct DualReadConfig {
    pub primary_source: DataSource,
    pub fallback_enabled: bool,
    pub comparison_mode: bool,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_db_url: Option<String>,
    pub dynamodb_table_name: Option<String>,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub store_timeout: Duration,
    pub comparison_strategy: ComparisonStrategy,
}

impl DualReadConfig {
    /// A policy with no store parameters at all (clients are injected separately).
    pub fn policy_only(phase: &MigrationPhase) -> Self {
        Self::project(phase, &Settings::default())
    }

    fn project(phase: &MigrationPhase, settings: &Settings) -> Self {
        Self {
            primary_source: phase.primary_source,
            fallback_enabled: phase.fallback_enabled,
            comparison_mode: phase.comparison_mode,
            supabase_url: settings.supabase_url.clone(),
            supabase_key: settings.supabase_key.clone(),
            supabase_db_url: settings.supabase_db_url.clone(),
            dynamodb_table_name: settings.dynamodb_table_name.clone(),
            dynamodb_endpoint: settings.dynamodb_endpoint.clone(),
            aws_region: settings.aws_region(),
            store_timeout: settings.store_timeout(),
            comparison_strategy: settings.comparison_strategy,
        }
    }
}

/// Snapshot for health/observability endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub phase: Phase,
    pub primary_source: DataSource,
    pub fallback_enabled: bool,
    pub comparison_mode: bool,
    pub timestamp: DateTime<Utc>,
}

pub struct MigrationConfig {
    current: RwLock<MigrationPhase>,
    settings: Settings,
}

impl MigrationConfig {
    /// Builds the configuration from settings; the phase comes from `MIGRATION_PHASE`.
    ///
    /// A missing label means `pre-migration`; an unknown one also means `pre-migration`, with a warning.
    pub fn new(settings: Settings) -> Self {
        let phase = match settings.migration_phase.as_deref() {
            Some(label) => Phase::resolve_label(label).0,
            None => Phase::PreMigration,
        };
        tracing::info!(phase = %phase, "Migration phase loaded");
        Self {
            current: RwLock::new(MigrationPhase::for_phase(phase)),
            settings,
        }
    }

    pub fn with_phase(phase: Phase, settings: Settings) -> Self {
        Self {
            current: RwLock::new(MigrationPhase::for_phase(phase)),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_phase(&self) -> MigrationPhase {
        // The record is Copy and only ever replaced whole, so a poisoned lock still holds a valid value.
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dual_read_policy(&self) -> DualReadConfig {
        DualReadConfig::project(&self.current_phase(), &self.settings)
    }

    pub fn should_write_to_supabase(&self) -> bool {
        self.current_phase().write_to_supabase
    }

    pub fn should_write_to_dynamodb(&self) -> bool {
        self.current_phase().write_to_dynamodb
    }

    pub fn is_comparison_mode_enabled(&self) -> bool {
        self.current_phase().comparison_mode
    }

    pub fn is_fallback_enabled(&self) -> bool {
        self.current_phase().fallback_enabled
    }

    /// Atomically replaces the phase record.
    pub fn set_phase(&self, phase: Phase) -> MigrationPhase {
        let record = MigrationPhase::for_phase(phase);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = guard.phase;
        *guard = record;
        drop(guard);
        tracing::info!(from = %previous, to = %phase, "Migration phase changed");
        record
    }

    /// Label form of [`set_phase`](Self::set_phase); unknown labels apply `pre-migration`.
    ///
    /// Returns the applied record and whether the label was recognised.
    pub fn set_phase_label(&self, label: &str) -> (MigrationPhase, bool) {
        let (phase, recognised) = Phase::resolve_label(label);
        (self.set_phase(phase), recognised)
    }

    pub fn migration_status(&self) -> MigrationStatus {
        let current = self.current_phase();
        MigrationStatus {
            phase: current.phase,
            primary_source: current.primary_source,
            fallback_enabled: current.fallback_enabled,
            comparison_mode: current.comparison_mode,
            timestamp: Utc::now(),
        }
    }
}
