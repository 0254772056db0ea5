//! Supabase REST (PostgREST) client.

use crate::storage::supabase::ensure_ident;
use crate::storage::RelationalStore;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value as JsonValue;

/// Reads rows through `{SUPABASE_URL}/rest/v1/{table}` with the service-role key.
pub struct PostgrestStore {
    http: reqwest::Client,
    rest_url: Url,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(supabase_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let base = Url::parse(supabase_url)
            .with_context(|| format!("SUPABASE_URL is not a valid URL: {}", supabase_url))?;
        let rest_url = base
            .join("rest/v1/")
            .context("Failed to build Supabase REST URL")?;
        Ok(Self {
            http: reqwest::Client::new(),
            rest_url,
            api_key: api_key.to_string(),
        })
    }

    /// Query string for `select`: PostgREST `eq.` filters plus an optional `limit`.
    pub fn query_params(filters: &[(&str, String)], limit: Option<u32>) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(
            filters
                .iter()
                .map(|(column, value)| (column.to_string(), format!("eq.{}", value))),
        );
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[async_trait]
impl RelationalStore for PostgrestStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        ensure_ident("table", table)?;
        for (column, _) in filters {
            ensure_ident("column", column)?;
        }

        let url = self.rest_url.join(table)?;
        let response = self
            .http
            .get(url)
            .query(&Self::query_params(filters, limit))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Supabase request for {} failed", table))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            // PostgREST errors look like {"code": "...", "message": "...", "details": ...}.
            let message = serde_json::from_str::<JsonValue>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(JsonValue::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(anyhow!("{} (HTTP {})", message, status.as_u16()));
        }

        serde_json::from_str(&body).context("Supabase returned a non-array body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_is_derived_from_project_url() {
        let store = PostgrestStore::new("https://abc.supabase.co", "key").unwrap();
        assert_eq!(store.rest_url.as_str(), "https://abc.supabase.co/rest/v1/");
        assert_eq!(
            store.rest_url.join("profiles").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/profiles"
        );
        assert!(PostgrestStore::new("not a url", "key").is_err());
    }

    #[test]
    fn filters_become_eq_params() {
        let params = PostgrestStore::query_params(&[("id", "u1".into()), ("email", "a@b.co".into())], Some(1));
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("id".to_string(), "eq.u1".to_string()),
                ("email".to_string(), "eq.a@b.co".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }
}
