//! Entity types, read queries and their translation into each store's access pattern.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Entity families known to the single-table layout, plus a catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    Profiles,
    Accounts,
    Transactions,
    FinancialProducts,
    /// Entities without a dedicated key layout (`transfers`, `payments`, ...).
    Other(String),
}

impl EntityType {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "profiles" => EntityType::Profiles,
            "accounts" => EntityType::Accounts,
            "transactions" => EntityType::Transactions,
            "financial_products" => EntityType::FinancialProducts,
            other => EntityType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Profiles => "profiles",
            EntityType::Accounts => "accounts",
            EntityType::Transactions => "transactions",
            EntityType::FinancialProducts => "financial_products",
            EntityType::Other(name) => name,
        }
    }

    /// Relational table backing this entity (same name on both sides of the migration).
    pub fn table_name(&self) -> &str {
        self.as_str()
    }

    /// Value of the `entityType` attribute used when scanning the single table.
    pub fn scan_tag(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        EntityType::parse(name)
    }
}

/// Key/filter bag for one logical read. Field meaning depends on the entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Creation timestamp; part of the transaction sort key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Return the first matching row instead of a list.
    #[serde(default)]
    pub single: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl EntityQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn by_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Equality predicates for the relational store, as `(column, value)` pairs.
    pub fn relational_filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(id) = &self.id {
            filters.push(("id", id.clone()));
        }
        if let Some(user_id) = &self.user_id {
            filters.push(("user_id", user_id.clone()));
        }
        if let Some(email) = &self.email {
            filters.push(("email", email.clone()));
        }
        if let Some(account_id) = &self.account_id {
            filters.push(("account_id", account_id.clone()));
        }
        filters
    }

    /// Row cap for the relational read: `single` needs only one row.
    pub fn row_limit(&self) -> Option<u32> {
        if self.single {
            Some(self.limit.map_or(1, |l| l.min(1)))
        } else {
            self.limit
        }
    }
}

/// How a read is served by the key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPlan {
    /// Direct primary-key lookup.
    Get { pk: String, sk: String },
    /// Query on one partition, optionally restricted to a sort-key prefix.
    Partition {
        pk: String,
        sk_prefix: Option<String>,
    },
    /// Full-table scan filtered by `entityType` (and `email` when given).
    Scan {
        entity_tag: String,
        email: Option<String>,
    },
}

impl KeyPlan {
    pub fn for_query(entity: &EntityType, query: &EntityQuery) -> anyhow::Result<KeyPlan> {
        if let Some(id) = &query.id {
            let (pk, sk) = primary_key(entity, id, query)?;
            return Ok(KeyPlan::Get { pk, sk });
        }

        if let Some(user_id) = &query.user_id {
            let sk_prefix = match entity {
                EntityType::Profiles => Some("PROFILE".to_string()),
                EntityType::Accounts => Some("ACCOUNT#".to_string()),
                _ => None,
            };
            return Ok(KeyPlan::Partition {
                pk: format!("USER#{}", user_id),
                sk_prefix,
            });
        }

        if let (EntityType::Transactions, Some(account_id)) = (entity, &query.account_id) {
            return Ok(KeyPlan::Partition {
                pk: format!("ACCOUNT#{}", account_id),
                sk_prefix: Some("TRANSACTION#".to_string()),
            });
        }

        Ok(KeyPlan::Scan {
            entity_tag: entity.scan_tag(),
            email: query.email.clone(),
        })
    }
}

/// Partition and sort key of a single item.
fn primary_key(
    entity: &EntityType,
    id: &str,
    query: &EntityQuery,
) -> anyhow::Result<(String, String)> {
    let keys = match entity {
        EntityType::Profiles => (format!("USER#{}", id), "PROFILE".to_string()),
        EntityType::Accounts => {
            let pk = match &query.user_id {
                Some(user_id) => format!("USER#{}", user_id),
                None => format!("ACCOUNT#{}", id),
            };
            (pk, format!("ACCOUNT#{}", id))
        }
        EntityType::Transactions => {
            let Some(account_id) = query.account_id.as_deref() else {
                bail!("transactions lookup by id requires accountId");
            };
            let Some(created_at) = query.created_at.as_deref() else {
                bail!("transactions lookup by id requires createdAt");
            };
            (
                format!("ACCOUNT#{}", account_id),
                format!("TRANSACTION#{}#{}", created_at, id),
            )
        }
        EntityType::FinancialProducts => (format!("PRODUCT#{}", id), "DETAILS".to_string()),
        EntityType::Other(name) => (format!("{}#{}", name.to_uppercase(), id), "DETAILS".to_string()),
    };
    Ok(keys)
}
