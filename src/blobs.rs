//! Blob-storage collaborator: content-addressable-by-path uploads that
//! return a publicly resolvable URL.
//!
//! The hosted variant PUTs bytes to `{base}/{bucket}/{path}` and derives the
//! public URL from the storage host; the in-memory variant keeps objects in a
//! map for development and tests. Uploads are never retried here — a failed
//! upload aborts the whole degree/user operation upstream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::BlobStorageCfg;
use crate::error::ApiError;
use crate::util::trunc_for_log;

const DEFAULT_PUBLIC_BASE: &str = "https://storage.googleapis.com";

pub enum BlobStore {
  Hosted(HostedBlobStore),
  Memory(MemoryBlobStore),
}

impl BlobStore {
  /// Upload bytes under `path` and return the public URL.
  pub async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ApiError> {
    match self {
      BlobStore::Hosted(s) => s.put(path, bytes, content_type).await,
      BlobStore::Memory(s) => s.put(path, bytes, content_type).await,
    }
  }
}

// --- Hosted variant ---

pub struct HostedBlobStore {
  client: reqwest::Client,
  base_url: String,
  bucket: String,
  api_key: String,
  public_base_url: String,
}

impl HostedBlobStore {
  pub fn new(cfg: &BlobStorageCfg) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .ok()?;
    Some(Self {
      client,
      base_url: cfg.base_url.clone(),
      bucket: cfg.bucket.clone(),
      api_key: cfg.api_key.clone(),
      public_base_url: cfg
        .public_base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_PUBLIC_BASE.to_string()),
    })
  }

  #[instrument(level = "info", skip(self, bytes), fields(%path, size = bytes.len()))]
  async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ApiError> {
    let url = format!("{}/{}/{}", self.base_url, self.bucket, path);
    let res = self
      .client
      .put(&url)
      .header(USER_AGENT, "academia-backend/0.1")
      .header(CONTENT_TYPE, content_type)
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .body(bytes)
      .send()
      .await
      .map_err(|e| ApiError::Upload(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(ApiError::Upload(format!(
        "blob storage HTTP {status}: {}",
        trunc_for_log(&body, 256)
      )));
    }

    let public_url = format!("{}/{}/{}", self.public_base_url, self.bucket, path);
    info!(target: "academia_backend", %path, %public_url, "blob uploaded");
    Ok(public_url)
  }
}

// --- In-memory variant ---

/// In-memory stand-in. Cloning shares the same object map, so tests can keep
/// a handle and count what the code under test uploaded.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
  objects: Arc<RwLock<HashMap<String, (String, Vec<u8>)>>>,
}

impl MemoryBlobStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ApiError> {
    let mut objects = self.objects.write().await;
    objects.insert(path.to_string(), (content_type.to_string(), bytes));
    Ok(format!("memory://{path}"))
  }

  #[allow(dead_code)]
  pub async fn object_count(&self) -> usize {
    self.objects.read().await.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn memory_put_returns_resolvable_url() {
    let blobs = MemoryBlobStore::new();
    let url = blobs.put("thumbnails/x_pic.png", vec![1, 2, 3], "image/png").await.expect("put");
    assert_eq!(url, "memory://thumbnails/x_pic.png");
    assert_eq!(blobs.object_count().await, 1);
  }
}
