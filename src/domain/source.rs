//! The two backing stores taking part in the migration.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Supabase,
    #[serde(rename = "dynamodb")]
    DynamoDb,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Supabase => "supabase",
            DataSource::DynamoDb => "dynamodb",
        }
    }

    /// The store that is not `self`.
    pub fn other(&self) -> DataSource {
        match self {
            DataSource::Supabase => DataSource::DynamoDb,
            DataSource::DynamoDb => DataSource::Supabase,
        }
    }

    /// Human-facing name used in log lines and recommendations.
    pub fn display_name(&self) -> &'static str {
        match self {
            DataSource::Supabase => "Supabase",
            DataSource::DynamoDb => "DynamoDB",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
