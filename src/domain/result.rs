//! Result bundles produced by the dual-read coordinator.

use crate::domain::source::DataSource;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use utoipa::ToSchema;

/// Outcome of querying one backing store.
///
/// Built only through the constructors below so that a failed read never carries data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceResult {
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock milliseconds from call start to completion.
    pub response_time: u64,
}

impl DataSourceResult {
    pub fn success(source: DataSource, data: Option<JsonValue>, elapsed: Duration) -> Self {
        Self {
            data,
            source,
            error: None,
            response_time: millis(elapsed),
        }
    }

    pub fn failure(source: DataSource, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            data: None,
            source,
            error: Some(error.into()),
            response_time: millis(elapsed),
        }
    }

    /// Synthesized result for a store whose client was never constructed.
    pub fn not_initialized(source: DataSource) -> Self {
        Self::failure(source, "Client not initialized", Duration::ZERO)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// `data` that is present and not JSON `null`.
    pub fn present_data(&self) -> Option<&JsonValue> {
        self.data.as_ref().filter(|v| !v.is_null())
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Comparison {
    #[serde(rename = "match")]
    pub matches: bool,
    pub differences: Vec<String>,
}

impl Comparison {
    pub fn matched() -> Self {
        Self {
            matches: true,
            differences: Vec::new(),
        }
    }

    pub fn from_differences(differences: Vec<String>) -> Self {
        Self {
            matches: differences.is_empty(),
            differences,
        }
    }
}

/// Outcome of one logical read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DualReadResult {
    pub primary: DataSourceResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<DataSourceResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
}

impl DualReadResult {
    /// The payload a caller should use: primary data, else fallback data.
    pub fn data(&self) -> Option<&JsonValue> {
        self.primary
            .present_data()
            .or_else(|| self.fallback.as_ref().and_then(|f| f.present_data()))
    }

    /// The result that produced [`data`](Self::data), if any.
    pub fn served_by(&self) -> Option<DataSource> {
        if self.primary.present_data().is_some() {
            return Some(self.primary.source);
        }
        self.fallback
            .as_ref()
            .filter(|f| f.present_data().is_some())
            .map(|f| f.source)
    }
}

/// Reachability of one store as seen by the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceHealth {
    pub available: bool,
    pub response_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DataSourceResult> for SourceHealth {
    fn from(result: DataSourceResult) -> Self {
        Self {
            available: result.error.is_none(),
            response_time: result.response_time,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    pub supabase: SourceHealth,
    pub dynamodb: SourceHealth,
}

impl HealthReport {
    pub fn for_source(&self, source: DataSource) -> &SourceHealth {
        match source {
            DataSource::Supabase => &self.supabase,
            DataSource::DynamoDb => &self.dynamodb,
        }
    }
}
