pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::dual_read_service::DualReadService;
pub use app::health::{migration_health, MigrationHealth};
pub use domain::{
    DataSource, DataSourceResult, DualReadConfig, DualReadResult, EntityQuery, EntityType,
    HealthReport, MigrationConfig, MigrationPhase, MigrationStatus, Phase,
};
pub use infra::config::Settings;
pub use storage::{KeyValueStore, RelationalStore, StoreClients};
