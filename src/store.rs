//! Document-store collaborator: point reads, equality queries, inserts with
//! server-generated ids, field-level updates, and deletes.
//!
//! The hosted variant speaks the store's JSON REST dialect over reqwest; the
//! in-memory variant backs local development and tests. Only single-document
//! writes are atomic — there are no cross-document transactions, which is why
//! the user service serializes its read-modify-write sequences itself.
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::HostedServiceCfg;
use crate::error::ApiError;
use crate::util::trunc_for_log;

pub enum Store {
  Hosted(HostedStore),
  Memory(MemoryStore),
}

impl Store {
  /// Point read. `Ok(None)` when the document does not exist.
  pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, ApiError> {
    match self {
      Store::Hosted(s) => s.get(collection, id).await,
      Store::Memory(s) => s.get(collection, id).await,
    }
  }

  /// Equality-filtered query. Returns `(document id, document)` pairs.
  pub async fn query_eq(
    &self,
    collection: &str,
    field: &str,
    value: &str,
  ) -> Result<Vec<(String, Value)>, ApiError> {
    match self {
      Store::Hosted(s) => s.query_eq(collection, field, value).await,
      Store::Memory(s) => s.query_eq(collection, field, value).await,
    }
  }

  /// Whole-collection scan, in the order the store returns documents.
  pub async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, ApiError> {
    match self {
      Store::Hosted(s) => s.list(collection).await,
      Store::Memory(s) => s.list(collection).await,
    }
  }

  /// Insert with a server-generated id.
  pub async fn add(&self, collection: &str, doc: Value) -> Result<String, ApiError> {
    match self {
      Store::Hosted(s) => s.add(collection, doc).await,
      Store::Memory(s) => s.add(collection, doc).await,
    }
  }

  /// Insert or replace under a caller-chosen id (used for identity-keyed
  /// user documents).
  pub async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), ApiError> {
    match self {
      Store::Hosted(s) => s.set(collection, id, doc).await,
      Store::Memory(s) => s.set(collection, id, doc).await,
    }
  }

  /// Top-level field merge into an existing document.
  pub async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<(), ApiError> {
    match self {
      Store::Hosted(s) => s.update(collection, id, fields).await,
      Store::Memory(s) => s.update(collection, id, fields).await,
    }
  }

  /// Delete. Idempotent: deleting an absent document is a success.
  pub async fn delete(&self, collection: &str, id: &str) -> Result<(), ApiError> {
    match self {
      Store::Hosted(s) => s.delete(collection, id).await,
      Store::Memory(s) => s.delete(collection, id).await,
    }
  }
}

// --- Hosted variant ---

pub struct HostedStore {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

#[derive(Deserialize)]
struct StoredDoc {
  id: String,
  document: Value,
}

#[derive(Deserialize)]
struct AddedDoc {
  id: String,
}

impl HostedStore {
  /// Construct the client; returns None when the HTTP client cannot be built
  /// so the caller can fall back to the in-memory store.
  pub fn new(cfg: &HostedServiceCfg) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;
    Some(Self { client, base_url: cfg.base_url.clone(), api_key: cfg.api_key.clone() })
  }

  fn collection_url(&self, collection: &str) -> String {
    format!("{}/collections/{}/documents", self.base_url, collection)
  }

  fn doc_url(&self, collection: &str, id: &str) -> String {
    format!("{}/collections/{}/documents/{}", self.base_url, collection, id)
  }

  async fn check(res: reqwest::Response, op: &str) -> Result<reqwest::Response, ApiError> {
    if res.status().is_success() {
      return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    let msg = extract_service_error(&body).unwrap_or_else(|| trunc_for_log(&body, 256));
    Err(ApiError::Unknown(format!("document store {op} HTTP {status}: {msg}")))
  }

  #[instrument(level = "debug", skip(self), fields(%collection, %id))]
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, ApiError> {
    let res = self
      .client
      .get(self.doc_url(collection, id))
      .header(USER_AGENT, "academia-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send()
      .await?;
    if res.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let res = Self::check(res, "get").await?;
    Ok(Some(res.json::<Value>().await?))
  }

  #[instrument(level = "debug", skip(self, value), fields(%collection, %field))]
  async fn query_eq(
    &self,
    collection: &str,
    field: &str,
    value: &str,
  ) -> Result<Vec<(String, Value)>, ApiError> {
    let res = self
      .client
      .get(self.collection_url(collection))
      .query(&[("field", field), ("equals", value)])
      .header(USER_AGENT, "academia-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send()
      .await?;
    let res = Self::check(res, "query").await?;
    let docs: Vec<StoredDoc> = res.json().await?;
    Ok(docs.into_iter().map(|d| (d.id, d.document)).collect())
  }

  #[instrument(level = "debug", skip(self), fields(%collection))]
  async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, ApiError> {
    let res = self
      .client
      .get(self.collection_url(collection))
      .header(USER_AGENT, "academia-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send()
      .await?;
    let res = Self::check(res, "list").await?;
    let docs: Vec<StoredDoc> = res.json().await?;
    Ok(docs.into_iter().map(|d| (d.id, d.document)).collect())
  }

  #[instrument(level = "debug", skip(self, doc), fields(%collection))]
  async fn add(&self, collection: &str, doc: Value) -> Result<String, ApiError> {
    let res = self
      .client
      .post(self.collection_url(collection))
      .header(USER_AGENT, "academia-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&doc)
      .send()
      .await?;
    let res = Self::check(res, "add").await?;
    let added: AddedDoc = res.json().await?;
    info!(target: "academia_backend", %collection, id = %added.id, "document added");
    Ok(added.id)
  }

  #[instrument(level = "debug", skip(self, doc), fields(%collection, %id))]
  async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), ApiError> {
    let res = self
      .client
      .put(self.doc_url(collection, id))
      .header(USER_AGENT, "academia-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&doc)
      .send()
      .await?;
    Self::check(res, "set").await?;
    Ok(())
  }

  #[instrument(level = "debug", skip(self, fields), fields(%collection, %id))]
  async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<(), ApiError> {
    let res = self
      .client
      .patch(self.doc_url(collection, id))
      .header(USER_AGENT, "academia-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&fields)
      .send()
      .await?;
    if res.status() == reqwest::StatusCode::NOT_FOUND {
      return Err(ApiError::NotFound("Document not found.".into()));
    }
    Self::check(res, "update").await?;
    Ok(())
  }

  #[instrument(level = "debug", skip(self), fields(%collection, %id))]
  async fn delete(&self, collection: &str, id: &str) -> Result<(), ApiError> {
    let res = self
      .client
      .delete(self.doc_url(collection, id))
      .header(USER_AGENT, "academia-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send()
      .await?;
    if res.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(());
    }
    Self::check(res, "delete").await?;
    Ok(())
  }
}

/// Try to extract a clean error message from a collaborator error body.
fn extract_service_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

// --- In-memory variant ---

/// In-memory stand-in used when no document-db credentials are configured,
/// and as the substitutable fake in tests. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
  collections: Arc<RwLock<HashMap<String, HashMap<String, Value>>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, ApiError> {
    let cols = self.collections.read().await;
    Ok(cols.get(collection).and_then(|c| c.get(id)).cloned())
  }

  pub async fn query_eq(
    &self,
    collection: &str,
    field: &str,
    value: &str,
  ) -> Result<Vec<(String, Value)>, ApiError> {
    let cols = self.collections.read().await;
    let mut out = Vec::new();
    if let Some(col) = cols.get(collection) {
      for (id, doc) in col {
        if doc.get(field).and_then(Value::as_str) == Some(value) {
          out.push((id.clone(), doc.clone()));
        }
      }
    }
    Ok(out)
  }

  pub async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, ApiError> {
    let cols = self.collections.read().await;
    Ok(cols
      .get(collection)
      .map(|c| c.iter().map(|(id, doc)| (id.clone(), doc.clone())).collect())
      .unwrap_or_default())
  }

  pub async fn add(&self, collection: &str, doc: Value) -> Result<String, ApiError> {
    let id = Uuid::new_v4().to_string();
    let mut cols = self.collections.write().await;
    cols.entry(collection.to_string()).or_default().insert(id.clone(), doc);
    Ok(id)
  }

  pub async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), ApiError> {
    let mut cols = self.collections.write().await;
    cols.entry(collection.to_string()).or_default().insert(id.to_string(), doc);
    Ok(())
  }

  pub async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<(), ApiError> {
    let mut cols = self.collections.write().await;
    let doc = cols
      .get_mut(collection)
      .and_then(|c| c.get_mut(id))
      .ok_or_else(|| ApiError::NotFound("Document not found.".into()))?;
    match (doc, fields) {
      (Value::Object(existing), Value::Object(new_fields)) => {
        for (k, v) in new_fields {
          existing.insert(k, v);
        }
        Ok(())
      }
      _ => Err(ApiError::Unknown("update expects object documents".into())),
    }
  }

  pub async fn delete(&self, collection: &str, id: &str) -> Result<(), ApiError> {
    let mut cols = self.collections.write().await;
    if let Some(col) = cols.get_mut(collection) {
      col.remove(id);
    }
    Ok(())
  }

  /// Number of documents currently held in a collection.
  #[allow(dead_code)]
  pub async fn count(&self, collection: &str) -> usize {
    let cols = self.collections.read().await;
    cols.get(collection).map(|c| c.len()).unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn add_get_round_trip() {
    let store = MemoryStore::new();
    let id = store.add("things", json!({"a": 1})).await.expect("add");
    let doc = store.get("things", &id).await.expect("get").expect("present");
    assert_eq!(doc["a"], 1);
  }

  #[tokio::test]
  async fn update_merges_top_level_fields() {
    let store = MemoryStore::new();
    let id = store.add("things", json!({"a": 1, "b": 2})).await.expect("add");
    store.update("things", &id, json!({"b": 3, "c": 4})).await.expect("update");
    let doc = store.get("things", &id).await.expect("get").expect("present");
    assert_eq!(doc["a"], 1);
    assert_eq!(doc["b"], 3);
    assert_eq!(doc["c"], 4);
  }

  #[tokio::test]
  async fn update_missing_document_is_not_found() {
    let store = MemoryStore::new();
    let err = store.update("things", "nope", json!({"a": 1})).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn query_eq_matches_string_fields_only() {
    let store = MemoryStore::new();
    store.add("users", json!({"email": "a@x.io"})).await.expect("add");
    store.add("users", json!({"email": "b@x.io"})).await.expect("add");
    let hits = store.query_eq("users", "email", "a@x.io").await.expect("query");
    assert_eq!(hits.len(), 1);
    assert!(store.query_eq("users", "email", "c@x.io").await.expect("query").is_empty());
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let store = MemoryStore::new();
    let id = store.add("things", json!({})).await.expect("add");
    store.delete("things", &id).await.expect("delete");
    store.delete("things", &id).await.expect("second delete");
    assert_eq!(store.count("things").await, 0);
  }
}
