//! Migration phases and the fixed phase → policy table.

use crate::domain::source::DataSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    PreMigration,
    DualRead,
    DualWrite,
    PostMigration,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::PreMigration,
        Phase::DualRead,
        Phase::DualWrite,
        Phase::PostMigration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PreMigration => "pre-migration",
            Phase::DualRead => "dual-read",
            Phase::DualWrite => "dual-write",
            Phase::PostMigration => "post-migration",
        }
    }

    /// Resolves a label, falling back to `pre-migration` for anything unrecognised.
    ///
    /// Emits a warning for unknown labels. Returns whether the label was recognised.
    pub fn resolve_label(label: &str) -> (Phase, bool) {
        match label.parse::<Phase>() {
            Ok(phase) => (phase, true),
            Err(e) => {
                tracing::warn!("{}, defaulting to pre-migration", e);
                (Phase::PreMigration, false)
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown migration phase: {}", self.0)
    }
}

impl std::error::Error for UnknownPhase {}

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

/// The complete policy record for one phase.
///
/// `Copy` on purpose: readers take the whole record out from under the lock in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPhase {
    pub phase: Phase,
    pub primary_source: DataSource,
    pub fallback_enabled: bool,
    pub comparison_mode: bool,
    pub write_to_supabase: bool,
    #[serde(rename = "writeToDynamoDB")]
    pub write_to_dynamodb: bool,
}

impl MigrationPhase {
    /// The phase lookup table.
    pub const fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::PreMigration => Self {
                phase,
                primary_source: DataSource::Supabase,
                fallback_enabled: false,
                comparison_mode: false,
                write_to_supabase: true,
                write_to_dynamodb: false,
            },
            Phase::DualRead => Self {
                phase,
                primary_source: DataSource::Supabase,
                fallback_enabled: true,
                comparison_mode: true,
                write_to_supabase: true,
                write_to_dynamodb: false,
            },
            Phase::DualWrite => Self {
                phase,
                primary_source: DataSource::Supabase,
                fallback_enabled: true,
                comparison_mode: true,
                write_to_supabase: true,
                write_to_dynamodb: true,
            },
            Phase::PostMigration => Self {
                phase,
                primary_source: DataSource::DynamoDb,
                fallback_enabled: false,
                comparison_mode: false,
                write_to_supabase: false,
                write_to_dynamodb: true,
            },
        }
    }
}
