//! In-process stores with call counting, failure and latency injection.
//!
//! Used as test doubles for both sides of the migration and for local demos.

use crate::storage::{KeyValueStore, RelationalStore};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Call counter plus injectable failure/latency shared by both in-memory stores.
#[derive(Default)]
struct Faults {
    calls: AtomicU64,
    failure: Mutex<Option<String>>,
    latency: Mutex<Option<Duration>>,
}

impl Faults {
    async fn enter(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let latency = *self.latency.lock().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.failure.lock().await.as_ref() {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

/// Renders a scalar attribute the way an equality filter sees it.
fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_all(row: &JsonValue, filters: &[(&str, String)]) -> bool {
    filters.iter().all(|(field, expected)| {
        row.get(*field)
            .and_then(scalar_to_string)
            .is_some_and(|actual| &actual == expected)
    })
}

fn apply_limit(mut rows: Vec<JsonValue>, limit: Option<u32>) -> Vec<JsonValue> {
    if let Some(limit) = limit {
        rows.truncate(limit as usize);
    }
    rows
}

/// Tables of JSON rows, filtered like `select * ... where col = value`.
#[derive(Default)]
pub struct InMemoryRelationalStore {
    tables: Mutex<HashMap<String, Vec<JsonValue>>>,
    faults: Faults,
}

impl InMemoryRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, table: &str, row: JsonValue) {
        self.tables
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Number of `select` calls received, including failed ones.
    pub fn calls(&self) -> u64 {
        self.faults.calls.load(Ordering::Relaxed)
    }

    /// Every subsequent call fails with `message` (or succeeds again with `None`).
    pub async fn fail_with(&self, message: Option<&str>) {
        *self.faults.failure.lock().await = message.map(str::to_string);
    }

    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.faults.latency.lock().await = latency;
    }
}

#[async_trait]
impl RelationalStore for InMemoryRelationalStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        self.faults.enter().await?;
        let tables = self.tables.lock().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| anyhow!("relation \"public.{}\" does not exist", table))?
            .iter()
            .filter(|row| matches_all(row, filters))
            .cloned()
            .collect();
        Ok(apply_limit(rows, limit))
    }
}

/// A single table of items keyed by their `PK`/`SK` attributes, ordered by key.
///
/// Scans behave like DynamoDB's: each page evaluates up to `scan_page_size` items,
/// then drops the ones failing the filter, and paging continues until the limit is met.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    items: Mutex<BTreeMap<(String, String), JsonValue>>,
    faults: Faults,
    scan_page_size: Mutex<Option<usize>>,
    scan_pages: AtomicU64,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an item; it must carry string `PK` and `SK` attributes.
    pub async fn put(&self, item: JsonValue) -> anyhow::Result<()> {
        let key = |name: &str| {
            item.get(name)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("item is missing string attribute {}", name))
        };
        let (pk, sk) = (key("PK")?, key("SK")?);
        self.items.lock().await.insert((pk, sk), item);
        Ok(())
    }

    pub fn calls(&self) -> u64 {
        self.faults.calls.load(Ordering::Relaxed)
    }

    pub async fn fail_with(&self, message: Option<&str>) {
        *self.faults.failure.lock().await = message.map(str::to_string);
    }

    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.faults.latency.lock().await = latency;
    }

    /// Items evaluated per scan page; `None` evaluates the whole table in one page.
    pub async fn set_scan_page_size(&self, size: Option<usize>) {
        *self.scan_page_size.lock().await = size;
    }

    /// Scan pages read so far.
    pub fn scan_pages(&self) -> u64 {
        self.scan_pages.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get_item(&self, pk: &str, sk: &str) -> anyhow::Result<Option<JsonValue>> {
        self.faults.enter().await?;
        let items = self.items.lock().await;
        Ok(items.get(&(pk.to_string(), sk.to_string())).cloned())
    }

    async fn query(
        &self,
        pk: &str,
        sk_prefix: Option<&str>,
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        self.faults.enter().await?;
        let items = self.items.lock().await;
        let rows = items
            .iter()
            .filter(|((p, s), _)| p == pk && sk_prefix.map_or(true, |prefix| s.starts_with(prefix)))
            .map(|(_, item)| item.clone())
            .collect();
        Ok(apply_limit(rows, limit))
    }

    async fn scan(
        &self,
        filters: &[(&str, String)],
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<JsonValue>> {
        self.faults.enter().await?;
        let page_size = (*self.scan_page_size.lock().await).unwrap_or(usize::MAX).max(1);
        let items = self.items.lock().await;
        let evaluated: Vec<&JsonValue> = items.values().collect();

        let mut rows = Vec::new();
        for page in evaluated.chunks(page_size) {
            if limit.is_some_and(|l| rows.len() >= l as usize) {
                break;
            }
            self.scan_pages.fetch_add(1, Ordering::Relaxed);
            rows.extend(page.iter().filter(|item| matches_all(item, filters)).map(|item| (*item).clone()));
        }
        Ok(apply_limit(rows, limit))
    }
}
