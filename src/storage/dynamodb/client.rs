//! DynamoDB reads through the AWS SDK.

use crate::storage::dynamodb::attribute::item_to_json;
use crate::storage::KeyValueStore;
use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use aws_smithy_types::timeout::TimeoutConfig;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Reads items from one single-table design table.
#[derive(Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoDbStore {
    /// Builds a client that inherits credentials, retries and HTTP settings from `sdk_config`.
    ///
    /// `endpoint` overrides the regional endpoint (DynamoDB Local, VPC endpoints).
    pub fn new(
        sdk_config: &aws_config::SdkConfig,
        table_name: &str,
        region: &str,
        endpoint: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config)
            .region(aws_sdk_dynamodb::config::Region::new(region.to_string()));

        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let timeout_config = TimeoutConfig::builder().operation_timeout(timeout).build();
        builder = builder.timeout_config(timeout_config);

        Self::from_client(Client::from_conf(builder.build()), table_name)
    }

    /// Wraps a pre-built client.
    pub fn from_client(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

fn sdk_error<E>(operation: &str, err: E) -> anyhow::Error
where
    E: std::error::Error + 'static,
{
    anyhow!("DynamoDB {} failed: {}", operation, DisplayErrorContext(err))
}

fn limit_reached(limit: Option<u32>, collected: usize) -> bool {
    limit.is_some_and(|l| collected >= l as usize)
}

/// `#f0 = :f0 AND #f1 = :f1` for `count` equality filters.
fn filter_expression(count: usize) -> String {
    (0..count)
        .map(|i| format!("#f{} = :f{}", i, i))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[async_trait]
impl KeyValueStore for DynamoDbStore {
    async fn get_item(&self, pk: &str, sk: &str) -> anyhow::Result<Option<JsonValue>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.to_string()))
            .key("SK", AttributeValue::S(sk.to_string()))
            .send()
            .await
            .map_err(|e| sdk_error("GetItem", e))?;

        output.item().map(item_to_json).transpose()
    }

    async fn query(
        &self,
        pk: &str,
        sk_prefix: Option<&str>,
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        let mut request = self
            .client
            .query()
            .table_name(&self.table_name)
            .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()));
        let condition = match sk_prefix {
            Some(prefix) => {
                request = request.expression_attribute_values(":sk", AttributeValue::S(prefix.to_string()));
                "PK = :pk AND begins_with(SK, :sk)"
            }
            None => "PK = :pk",
        };
        request = request.key_condition_expression(condition);
        // Only a key condition here, so every evaluated item is a result.
        if let Some(limit) = limit {
            request = request.limit(i32::try_from(limit).unwrap_or(i32::MAX));
        }

        let mut items = request.into_paginator().items().send();
        let mut rows = Vec::new();
        while !limit_reached(limit, rows.len()) {
            match items.next().await {
                Some(item) => rows.push(item_to_json(&item.map_err(|e| sdk_error("Query", e))?)?),
                None => break,
            }
        }
        Ok(rows)
    }

    /// `Limit` on a Scan caps items evaluated before the filter, so it is never sent.
    /// Pages are followed until `limit` matching items are collected or the table ends.
    async fn scan(
        &self,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        let mut request = self.client.scan().table_name(&self.table_name);
        if !filters.is_empty() {
            request = request.filter_expression(filter_expression(filters.len()));
            for (i, (attribute, value)) in filters.iter().enumerate() {
                request = request
                    .expression_attribute_names(format!("#f{}", i), *attribute)
                    .expression_attribute_values(format!(":f{}", i), AttributeValue::S(value.clone()));
            }
        }

        let mut items = request.into_paginator().items().send();
        let mut rows = Vec::new();
        while !limit_reached(limit, rows.len()) {
            match items.next().await {
                Some(item) => rows.push(item_to_json(&item.map_err(|e| sdk_error("Scan", e))?)?),
                None => break,
            }
        }
        Ok(rows)
    }
}
