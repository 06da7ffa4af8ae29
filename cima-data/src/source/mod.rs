//! Data sources
//!
//! The stores only see the `DataSource` capability. Two HTTP
//! implementations exist, one per upstream shape:
//! - `backend`: the site's own JSON API
//! - `airtable`: direct Airtable REST access
//!
//! `memory` serves fixed collections without any network.

pub mod airtable;
pub mod backend;
pub mod memory;

pub use airtable::AirtableSource;
pub use backend::BackendSource;
pub use memory::MemorySource;

use crate::config::{MAX_REQUEST_TIMEOUT_SECS, MIN_REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::{AppError, Result};
use crate::models::{DocumentFull, DocumentPreview, EventFull, EventPreview, Person};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Fetches site collections from one backend variant
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All document previews, in source order
    async fn fetch_documents(&self) -> Result<Vec<DocumentPreview>>;

    /// One document with text and attachment link
    async fn fetch_document(&self, id: &str) -> Result<DocumentFull>;

    /// All event previews, in source order
    async fn fetch_events(&self) -> Result<Vec<EventPreview>>;

    /// One event with attachment link
    async fn fetch_event(&self, id: &str) -> Result<EventFull>;

    /// The people directory
    async fn fetch_people(&self) -> Result<Vec<Person>>;

    /// One person of the directory
    async fn fetch_person(&self, id: &str) -> Result<Person>;

    /// Add `email` to the mailing list
    async fn subscribe_to_mailing_list(&self, email: &str) -> Result<()>;
}

/// Shared HTTP client configuration for both remote sources
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let timeout = timeout_secs.clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS);

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout))
        .build()
        .map_err(|e| AppError::Generic(format!("Failed to create HTTP client: {}", e)))
}

/// Decode a JSON array body, treating any other JSON value as empty
pub(crate) fn list_or_empty<T: DeserializeOwned>(body: serde_json::Value) -> Result<Vec<T>> {
    match body {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(body)?),
        other => {
            tracing::warn!("Expected a JSON list, got {}; treating as empty", json_kind(&other));
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_or_empty_decodes_arrays() {
        let values: Vec<u32> = list_or_empty(json!([1, 2, 3])).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_list_or_empty_tolerates_non_lists() {
        let from_object: Vec<u32> = list_or_empty(json!({"detail": "oops"})).unwrap();
        let from_null: Vec<u32> = list_or_empty(json!(null)).unwrap();

        assert!(from_object.is_empty());
        assert!(from_null.is_empty());
    }

    #[test]
    fn test_list_or_empty_rejects_malformed_items() {
        let result: Result<Vec<u32>> = list_or_empty(json!(["one"]));
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }
}
