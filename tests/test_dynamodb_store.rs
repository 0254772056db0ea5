//! `DynamoDbStore` against an in-process endpoint speaking the DynamoDB JSON protocol.
//!
//! The endpoint evaluates one item per Scan page and applies the filter afterwards,
//! like DynamoDB does, so limited scans have to follow `LastEvaluatedKey`.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use migration_dual_read::storage::DynamoDbStore;
use migration_dual_read::KeyValueStore;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TABLE: &str = "banking";

#[derive(Default)]
struct FakeTable {
    items: Vec<Value>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl FakeTable {
    fn requests(&self, operation: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| op == operation)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn s(value: &str) -> Value {
    json!({ "S": value })
}

fn key_of(item: &Value) -> Value {
    json!({ "PK": item["PK"], "SK": item["SK"] })
}

fn scan_page(table: &FakeTable, body: &Value) -> Value {
    let start = body
        .get("ExclusiveStartKey")
        .and_then(|key| table.items.iter().position(|item| key_of(item) == *key))
        .map_or(0, |p| p + 1);
    let page: Vec<&Value> = table.items.iter().skip(start).take(1).collect();

    let names = body["ExpressionAttributeNames"].as_object().cloned().unwrap_or_default();
    let matched: Vec<Value> = page
        .iter()
        .filter(|item| {
            names.iter().all(|(placeholder, attribute)| {
                let value_key = placeholder.replacen('#', ":", 1);
                attribute
                    .as_str()
                    .is_some_and(|a| item.get(a) == body["ExpressionAttributeValues"].get(&value_key))
            })
        })
        .map(|item| (*item).clone())
        .collect();

    let mut out = json!({ "Items": matched, "Count": matched.len(), "ScannedCount": page.len() });
    if let Some(last) = page.last() {
        if start + page.len() < table.items.len() {
            out["LastEvaluatedKey"] = key_of(last);
        }
    }
    out
}

fn query_page(table: &FakeTable, body: &Value) -> Value {
    let values = &body["ExpressionAttributeValues"];
    let prefix = values[":sk"]["S"].as_str();
    let mut items: Vec<Value> = table
        .items
        .iter()
        .filter(|item| item["PK"] == values[":pk"])
        .filter(|item| prefix.map_or(true, |p| item["SK"]["S"].as_str().is_some_and(|sk| sk.starts_with(p))))
        .cloned()
        .collect();
    if let Some(limit) = body["Limit"].as_u64() {
        items.truncate(limit as usize);
    }
    json!({ "Items": items, "Count": items.len(), "ScannedCount": items.len() })
}

async fn dynamodb_endpoint(
    State(table): State<Arc<FakeTable>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let operation = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .and_then(|t| t.rsplit('.').next())
        .unwrap_or_default()
        .to_string();
    let body: Value = serde_json::from_str(&body).unwrap_or_default();
    table.requests.lock().unwrap().push((operation.clone(), body.clone()));

    let content_type = [(header::CONTENT_TYPE, "application/x-amz-json-1.0")];
    if body["TableName"] != TABLE {
        let error = json!({
            "__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
            "message": "Requested resource not found"
        });
        return (StatusCode::BAD_REQUEST, content_type, error.to_string());
    }

    let out = match operation.as_str() {
        "GetItem" => match table.items.iter().find(|item| key_of(item) == body["Key"]) {
            Some(item) => json!({ "Item": item }),
            None => json!({}),
        },
        "Query" => query_page(&table, &body),
        "Scan" => scan_page(&table, &body),
        _ => json!({}),
    };
    (StatusCode::OK, content_type, out.to_string())
}

async fn spawn_endpoint(items: Vec<Value>) -> (String, Arc<FakeTable>, tokio::task::JoinHandle<()>) {
    let table = Arc::new(FakeTable {
        items,
        ..FakeTable::default()
    });
    let router = Router::new()
        .route("/", post(dynamodb_endpoint))
        .with_state(table.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://127.0.0.1:{}", port), table, handle)
}

async fn store_for(endpoint: &str, table_name: &str) -> DynamoDbStore {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("ap-southeast-2"))
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
        .load()
        .await;
    DynamoDbStore::new(&sdk_config, table_name, "ap-southeast-2", Some(endpoint), Duration::from_secs(5))
}

fn banking_items() -> Vec<Value> {
    vec![
        json!({"PK": s("ACCOUNT#a1"), "SK": s("DETAILS"), "entityType": s("ACCOUNTS"), "id": s("a1")}),
        json!({"PK": s("USER#u1"), "SK": s("ACCOUNT#a1"), "entityType": s("ACCOUNTS"), "id": s("a1"), "balance": {"N": "10.5"}}),
        json!({"PK": s("USER#u1"), "SK": s("PROFILE"), "entityType": s("PROFILES"), "id": s("u1"), "email": s("ada@example.com")}),
        json!({"PK": s("USER#u2"), "SK": s("PROFILE"), "entityType": s("PROFILES"), "id": s("u2"), "email": s("bob@example.com")}),
        json!({"PK": s("USER#u3"), "SK": s("PROFILE"), "entityType": s("PROFILES"), "id": s("u3"), "email": s("cy@example.com")}),
    ]
}

#[tokio::test]
async fn limited_scan_follows_pages_until_enough_rows_match() {
    let (endpoint, table, handle) = spawn_endpoint(banking_items()).await;
    let store = store_for(&endpoint, TABLE).await;

    let rows = store.scan(&[("entityType", "PROFILES".to_string())], Some(1)).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "u1");
    let scans = table.requests("Scan");
    // Two pages of accounts had to be read past before the first profile.
    assert!(scans.len() >= 3, "{}", scans.len());
    assert!(scans.iter().all(|body| body.get("Limit").is_none()));
    assert_eq!(scans[0]["FilterExpression"], "#f0 = :f0");
    assert_eq!(scans[0]["ExpressionAttributeNames"]["#f0"], "entityType");

    handle.abort();
}

#[tokio::test]
async fn scan_without_limit_reads_the_whole_table() {
    let (endpoint, table, handle) = spawn_endpoint(banking_items()).await;
    let store = store_for(&endpoint, TABLE).await;

    let rows = store.scan(&[("entityType", "PROFILES".to_string())], None).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(table.requests("Scan").len(), 5);

    let by_email = store
        .scan(
            &[("entityType", "PROFILES".to_string()), ("email", "bob@example.com".to_string())],
            Some(1),
        )
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0]["id"], "u2");

    handle.abort();
}

#[tokio::test]
async fn get_item_and_query_return_plain_json() {
    let (endpoint, table, handle) = spawn_endpoint(banking_items()).await;
    let store = store_for(&endpoint, TABLE).await;

    let profile = store.get_item("USER#u1", "PROFILE").await.unwrap().unwrap();
    assert_eq!(profile["email"], "ada@example.com");
    assert_eq!(profile["PK"], "USER#u1");
    assert!(store.get_item("USER#u9", "PROFILE").await.unwrap().is_none());

    let accounts = store.query("USER#u1", Some("ACCOUNT#"), None).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["balance"], 10.5);
    let queries = table.requests("Query");
    assert_eq!(queries[0]["KeyConditionExpression"], "PK = :pk AND begins_with(SK, :sk)");

    let limited = store.query("USER#u1", None, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(table.requests("Query").last().unwrap()["Limit"], 1);

    handle.abort();
}

#[tokio::test]
async fn service_errors_become_read_errors() {
    let (endpoint, _table, handle) = spawn_endpoint(banking_items()).await;
    let store = store_for(&endpoint, "missing").await;

    let err = store.get_item("USER#u1", "PROFILE").await.unwrap_err().to_string();
    assert!(err.starts_with("DynamoDB GetItem failed"), "{}", err);
    assert!(err.contains("Requested resource not found"), "{}", err);

    handle.abort();
}
