//! Direct Postgres access to the Supabase database.

use crate::storage::supabase::ensure_ident;
use crate::storage::RelationalStore;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

/// Relational store backed by a sqlx pool. Rows come back as `row_to_json(t.*)`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool that opens connections on first use.
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .context("SUPABASE_DB_URL is not a valid Postgres URL")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn build_select<'a>(
        table: &str,
        filters: &'a [(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<QueryBuilder<'a, Postgres>> {
        ensure_ident("table", table)?;
        let mut builder = QueryBuilder::new(format!(
            "SELECT row_to_json(t.*) AS record FROM {} t",
            table
        ));
        for (i, (column, value)) in filters.iter().enumerate() {
            ensure_ident("column", column)?;
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            // Compare as text so uuid/int keys match the string filters.
            builder.push(format!("t.{}::text = ", column));
            builder.push_bind(value.as_str());
        }
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(limit));
        }
        Ok(builder)
    }
}

#[async_trait]
impl RelationalStore for PostgresStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        let mut builder = Self::build_select(table, filters, limit)?;
        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record: JsonValue = row.try_get("record")?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_sql_uses_text_equality_and_limit() {
        let filters = [("id", "u1".to_string()), ("email", "a@b.co".to_string())];
        let builder = PostgresStore::build_select("profiles", &filters, Some(1)).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT row_to_json(t.*) AS record FROM profiles t WHERE t.id::text = $1 AND t.email::text = $2 LIMIT $3"
        );
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(PostgresStore::build_select("profiles t; --", &[], None).is_err());
        let filters = [("id = id or 1", "x".to_string())];
        assert!(PostgresStore::build_select("profiles", &filters, None).is_err());
    }
}
