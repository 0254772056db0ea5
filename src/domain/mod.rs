//! Domain types for the Supabase → DynamoDB read migration.

pub mod compare;
pub mod entity;
pub mod migration;
pub mod recommendations;
pub mod result;
pub mod source;

pub use entity::{EntityQuery, EntityType, KeyPlan};
pub use migration::{DualReadConfig, MigrationConfig, MigrationPhase, MigrationStatus, Phase};
pub use result::{Comparison, DataSourceResult, DualReadResult, HealthReport, SourceHealth};
pub use source::DataSource;
