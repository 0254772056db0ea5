//! Centralized configuration (environment variables + defaults).
//!
//! Values are read once into [`Settings`] by the binaries and injected from there;
//! nothing below the composition root touches the process environment.

use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_AWS_REGION: &str = "ap-southeast-2";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// How the coordinator compares primary and fallback payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonStrategy {
    /// Canonical serialization compared for equality; one opaque difference on mismatch.
    #[default]
    Literal,
    /// Field-by-field diff with numeric tolerance; one difference per JSON path.
    Structural,
}

impl ComparisonStrategy {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "literal" => Some(Self::Literal),
            "structural" => Some(Self::Structural),
            _ => None,
        }
    }
}

/// Process configuration: store endpoints and the initial migration phase label.
///
/// AWS credentials are not read here; the SDK's default provider chain resolves them.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub migration_phase: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_db_url: Option<String>,
    pub dynamodb_table_name: Option<String>,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub store_timeout: Option<Duration>,
    pub comparison_strategy: ComparisonStrategy,
    pub bind_addr: Option<String>,
    pub allow_phase_override: bool,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings from an explicit key/value map (tests, embedding).
    pub fn from_map(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty strings count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store_timeout = get("STORE_TIMEOUT_MS").and_then(|raw| match raw.parse::<u64>() {
            Ok(ms) => Some(Duration::from_millis(ms.max(1))),
            Err(_) => {
                tracing::warn!(value = %raw, "STORE_TIMEOUT_MS is not a valid integer, using default");
                None
            }
        });

        let comparison_strategy = match get("COMPARISON_STRATEGY") {
            Some(raw) => ComparisonStrategy::from_label(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown COMPARISON_STRATEGY, using literal");
                ComparisonStrategy::Literal
            }),
            None => ComparisonStrategy::Literal,
        };

        Self {
            migration_phase: get("MIGRATION_PHASE"),
            supabase_url: get("SUPABASE_URL"),
            supabase_key: get("SUPABASE_SERVICE_ROLE_KEY"),
            supabase_db_url: get("SUPABASE_DB_URL"),
            dynamodb_table_name: get("DYNAMODB_TABLE_NAME"),
            dynamodb_endpoint: get("DYNAMODB_ENDPOINT"),
            aws_region: get("AWS_REGION"),
            store_timeout,
            comparison_strategy,
            bind_addr: get("BIND_ADDR"),
            allow_phase_override: get("ALLOW_PHASE_OVERRIDE").as_deref() == Some("true"),
        }
    }

    pub fn aws_region(&self) -> String {
        self.aws_region
            .clone()
            .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string())
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
            .unwrap_or(Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS))
    }

    pub fn bind_addr(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
    }
}
