//! Store clients consumed by the dual-read coordinator.
//!
//! The coordinator only sees the two traits below; concrete adapters live in the submodules.

pub mod dynamodb;
pub mod memory;
pub mod supabase;

use crate::domain::migration::DualReadConfig;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub use dynamodb::DynamoDbStore;
pub use memory::{InMemoryKeyValueStore, InMemoryRelationalStore};
pub use supabase::{PostgresStore, PostgrestStore};

/// Relational (Postgres-style) store: `select * from <table> where <equality filters> [limit n]`.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>>;
}

/// Key-value store over a single table of flat items keyed by `PK`/`SK`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, pk: &str, sk: &str) -> anyhow::Result<Option<JsonValue>>;

    /// Items of one partition, optionally restricted to sort keys starting with `sk_prefix`.
    async fn query(
        &self,
        pk: &str,
        sk_prefix: Option<&str>,
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>>;

    /// Full-table scan keeping items whose attributes equal every `(attribute, value)` filter.
    async fn scan(
        &self,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>>;
}

/// The store clients available to a coordinator. Either side may be missing.
#[derive(Clone, Default)]
pub struct StoreClients {
    pub supabase: Option<Arc<dyn RelationalStore>>,
    pub dynamodb: Option<Arc<dyn KeyValueStore>>,
}

impl StoreClients {
    pub fn new(
        supabase: Option<Arc<dyn RelationalStore>>,
        dynamodb: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        Self { supabase, dynamodb }
    }

    /// Builds a client per store whose connection parameters are present. No store is contacted.
    ///
    /// A direct database URL takes precedence over the Supabase REST endpoint. DynamoDB
    /// credentials come from the AWS default chain (environment, profile files, IAM roles).
    pub async fn from_config(config: &DualReadConfig) -> anyhow::Result<Self> {
        let supabase: Option<Arc<dyn RelationalStore>> =
            match (&config.supabase_db_url, &config.supabase_url, &config.supabase_key) {
                (Some(db_url), _, _) => Some(Arc::new(PostgresStore::connect_lazy(db_url)?)),
                (None, Some(url), Some(key)) => Some(Arc::new(PostgrestStore::new(url, key)?)),
                _ => None,
            };

        let dynamodb: Option<Arc<dyn KeyValueStore>> = match &config.dynamodb_table_name {
            Some(table) => {
                let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                Some(Arc::new(DynamoDbStore::new(
                    &sdk_config,
                    table,
                    &config.aws_region,
                    config.dynamodb_endpoint.as_deref(),
                    config.store_timeout,
                )))
            }
            None => None,
        };

        if supabase.is_none() {
            tracing::info!("Supabase connection parameters missing; client not initialized");
        }
        if dynamodb.is_none() {
            tracing::info!("DYNAMODB_TABLE_NAME missing; DynamoDB client not initialized");
        }

        Ok(Self { supabase, dynamodb })
    }
}
