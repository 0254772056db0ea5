//! Migration phase configuration: which store is primary, and where writes go.

pub mod config;
pub mod phase;

pub use config::{DualReadConfig, MigrationConfig, MigrationStatus};
pub use phase::{MigrationPhase, Phase, UnknownPhase};
