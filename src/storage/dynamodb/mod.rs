//! DynamoDB single-table client.

pub mod attribute;
pub mod client;

pub use client::DynamoDbStore;
