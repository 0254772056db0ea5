//! The Dual-Read Service.
//!
//! This module sits between request handlers and the two stores taking part in the migration.
//! It is responsible for:
//! 1.  Reading from the configured primary store, with a per-store deadline.
//! 2.  Reading from the other store when fallback is enabled or the primary failed.
//! 3.  Comparing both payloads when comparison mode is on.
//!
//! Store failures never escape: they are recorded in the per-source result.

use crate::crypto::hashing::payload_digest;
use crate::domain::compare::compare_with;
use crate::domain::entity::{EntityQuery, EntityType, KeyPlan};
use crate::domain::migration::DualReadConfig;
use crate::domain::result::{DataSourceResult, DualReadResult, HealthReport};
use crate::domain::source::DataSource;
use crate::storage::StoreClients;
use anyhow::anyhow;
use serde_json::Value as JsonValue;
use std::time::Instant;

pub struct DualReadService {
    config: DualReadConfig,
    clients: StoreClients,
}

impl DualReadService {
    /// Builds the store clients whose connection parameters are present in `config`.
    pub async fn new(config: DualReadConfig) -> anyhow::Result<Self> {
        let clients = StoreClients::from_config(&config).await?;
        Ok(Self::with_clients(config, clients))
    }

    /// Uses already constructed clients (shared across requests, or test doubles).
    pub fn with_clients(config: DualReadConfig, clients: StoreClients) -> Self {
        Self { config, clients }
    }

    pub fn config(&self) -> &DualReadConfig {
        &self.config
    }

    fn has_client(&self, source: DataSource) -> bool {
        match source {
            DataSource::Supabase => self.clients.supabase.is_some(),
            DataSource::DynamoDb => self.clients.dynamodb.is_some(),
        }
    }

    async fn read_supabase(
        &self,
        entity: &EntityType,
        query: &EntityQuery,
    ) -> anyhow::Result<Option<JsonValue>> {
        let client = self
            .clients
            .supabase
            .as_ref()
            .ok_or_else(|| anyhow!("Supabase client not initialized"))?;

        let rows = client
            .select(entity.table_name(), &query.relational_filters(), query.row_limit())
            .await?;

        if query.single {
            Ok(rows.into_iter().next())
        } else {
            Ok(Some(JsonValue::Array(rows)))
        }
    }

    async fn read_dynamodb(
        &self,
        entity: &EntityType,
        query: &EntityQuery,
    ) -> anyhow::Result<Option<JsonValue>> {
        let client = self
            .clients
            .dynamodb
            .as_ref()
            .ok_or_else(|| anyhow!("DynamoDB client not initialized"))?;

        match KeyPlan::for_query(entity, query)? {
            KeyPlan::Get { pk, sk } => client.get_item(&pk, &sk).await,
            KeyPlan::Partition { pk, sk_prefix } => {
                let items = client.query(&pk, sk_prefix.as_deref(), query.limit).await?;
                Ok(Some(JsonValue::Array(items)))
            }
            KeyPlan::Scan { entity_tag, email } => {
                let mut filters = vec![("entityType", entity_tag)];
                if let Some(email) = email {
                    filters.push(("email", email));
                }
                let items = client.scan(&filters, query.limit).await?;
                Ok(Some(JsonValue::Array(items)))
            }
        }
    }

    /// One timed read against one store. Never fails; errors land in the result.
    async fn read_from(
        &self,
        source: DataSource,
        entity: &EntityType,
        query: &EntityQuery,
    ) -> DataSourceResult {
        let started = Instant::now();
        let read = async {
            match source {
                DataSource::Supabase => self.read_supabase(entity, query).await,
                DataSource::DynamoDb => self.read_dynamodb(entity, query).await,
            }
        };
        let outcome = tokio::time::timeout(self.config.store_timeout, read).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(data)) => {
                tracing::debug!(%source, %entity, elapsed_ms = elapsed.as_millis() as u64, "Read succeeded");
                DataSourceResult::success(source, data, elapsed)
            }
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                tracing::warn!(%source, %entity, error = %message, "Read failed");
                DataSourceResult::failure(source, message, elapsed)
            }
            Err(_) => {
                let message = format!(
                    "{} read timed out after {}ms",
                    source,
                    self.config.store_timeout.as_millis()
                );
                tracing::warn!(%source, %entity, "{}", message);
                DataSourceResult::failure(source, message, elapsed)
            }
        }
    }

    /// Reads `entity` according to the configured primary/fallback/comparison policy.
    pub async fn dual_read(
        &self,
        entity: impl Into<EntityType>,
        query: EntityQuery,
    ) -> DualReadResult {
        let entity = entity.into();
        let primary_source = self.config.primary_source;
        let fallback_source = primary_source.other();

        let (primary, fallback) = if self.config.fallback_enabled {
            // The fallback runs regardless of the primary outcome, so both go out together.
            let (primary, fallback) = tokio::join!(
                self.read_from(primary_source, &entity, &query),
                self.read_from(fallback_source, &entity, &query)
            );
            (primary, Some(fallback))
        } else {
            let primary = self.read_from(primary_source, &entity, &query).await;
            let fallback = if primary.is_error() {
                tracing::info!(%entity, from = %primary_source, to = %fallback_source, "Primary read failed, reading fallback");
                Some(self.read_from(fallback_source, &entity, &query).await)
            } else {
                None
            };
            (primary, fallback)
        };

        let comparison = match &fallback {
            Some(fallback) if self.config.comparison_mode => Some(compare_with(
                self.config.comparison_strategy,
                primary.data.as_ref(),
                fallback.data.as_ref(),
            )),
            _ => None,
        };

        if let (Some(cmp), Some(fallback)) = (&comparison, &fallback) {
            if !cmp.matches {
                let digest = |r: &DataSourceResult| r.present_data().map(payload_digest).unwrap_or_default();
                tracing::warn!(
                    %entity,
                    primary_digest = %digest(&primary),
                    fallback_digest = %digest(fallback),
                    differences = ?cmp.differences,
                    "Sources disagree"
                );
            }
        }

        DualReadResult {
            primary,
            fallback,
            comparison,
        }
    }

    /// Checks each constructed client with a one-row `profiles` read.
    ///
    /// A store without a client is reported unavailable without any call.
    pub async fn health_check(&self) -> HealthReport {
        let sample = EntityQuery::default().limit(1);
        let check = |source: DataSource| {
            let sample = &sample;
            async move {
                if self.has_client(source) {
                    self.read_from(source, &EntityType::Profiles, sample).await
                } else {
                    DataSourceResult::not_initialized(source)
                }
            }
        };

        let (supabase, dynamodb) = tokio::join!(check(DataSource::Supabase), check(DataSource::DynamoDb));
        HealthReport {
            supabase: supabase.into(),
            dynamodb: dynamodb.into(),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> DualReadResult {
        self.dual_read(EntityType::Profiles, EntityQuery::by_id(user_id).single())
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> DualReadResult {
        self.dual_read(EntityType::Profiles, EntityQuery::by_email(email).single())
            .await
    }

    pub async fn get_user_accounts(&self, user_id: &str) -> DualReadResult {
        self.dual_read(EntityType::Accounts, EntityQuery::by_user(user_id))
            .await
    }

    pub async fn get_account(&self, account_id: &str) -> DualReadResult {
        self.dual_read(EntityType::Accounts, EntityQuery::by_id(account_id).single())
            .await
    }

    pub async fn get_account_transactions(&self, account_id: &str) -> DualReadResult {
        self.dual_read(EntityType::Transactions, EntityQuery::by_account(account_id))
            .await
    }

    pub async fn get_financial_products(&self) -> DualReadResult {
        self.dual_read(EntityType::FinancialProducts, EntityQuery::default())
            .await
    }
}
