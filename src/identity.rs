//! Identity-provider collaborator: third-party sign-in token verification,
//! password-reset emails, and credential-account deletion.
//!
//! The provider's account records live outside the document store; the user
//! service keys federated user documents by the provider uid it returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::HostedServiceCfg;
use crate::error::ApiError;
use crate::util::trunc_for_log;

/// Claims extracted from a verified sign-in token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
  pub uid: String,
  pub email: String,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub picture: Option<String>,
}

pub enum IdentityProvider {
  Hosted(HostedIdentity),
  Memory(MemoryIdentity),
}

impl IdentityProvider {
  /// Verify a third-party sign-in token; an unverifiable token is an auth
  /// failure, not an internal error.
  pub async fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
    match self {
      IdentityProvider::Hosted(p) => p.verify_token(token).await,
      IdentityProvider::Memory(p) => p.verify_token(token).await,
    }
  }

  pub async fn send_password_reset(&self, email: &str) -> Result<(), ApiError> {
    match self {
      IdentityProvider::Hosted(p) => p.send_password_reset(email).await,
      IdentityProvider::Memory(p) => p.send_password_reset(email).await,
    }
  }

  /// Delete the provider-side account. Idempotent: an absent account is fine.
  pub async fn delete_account(&self, uid: &str) -> Result<(), ApiError> {
    match self {
      IdentityProvider::Hosted(p) => p.delete_account(uid).await,
      IdentityProvider::Memory(p) => p.delete_account(uid).await,
    }
  }
}

// --- Hosted variant ---

pub struct HostedIdentity {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

impl HostedIdentity {
  pub fn new(cfg: &HostedServiceCfg) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;
    Some(Self { client, base_url: cfg.base_url.clone(), api_key: cfg.api_key.clone() })
  }

  #[instrument(level = "info", skip(self, token))]
  async fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
    let url = format!("{}/accounts:verifyToken", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "academia-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&json!({ "token": token }))
      .send()
      .await?;

    if res.status() == reqwest::StatusCode::UNAUTHORIZED
      || res.status() == reqwest::StatusCode::BAD_REQUEST
    {
      return Err(ApiError::Auth("Invalid identity token.".into()));
    }
    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(ApiError::Unknown(format!(
        "identity provider HTTP {status}: {}",
        trunc_for_log(&body, 256)
      )));
    }

    let claims: Claims = res.json().await?;
    info!(target: "user", uid = %claims.uid, "identity token verified");
    Ok(claims)
  }

  #[instrument(level = "info", skip(self), fields(%email))]
  async fn send_password_reset(&self, email: &str) -> Result<(), ApiError> {
    let url = format!("{}/accounts:sendPasswordReset", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "academia-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&json!({ "email": email }))
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(ApiError::Unknown(format!(
        "identity provider HTTP {status}: {}",
        trunc_for_log(&body, 256)
      )));
    }
    Ok(())
  }

  #[instrument(level = "info", skip(self), fields(%uid))]
  async fn delete_account(&self, uid: &str) -> Result<(), ApiError> {
    let url = format!("{}/accounts/{}", self.base_url, uid);
    let res = self
      .client
      .delete(&url)
      .header(USER_AGENT, "academia-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send()
      .await?;

    if res.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(());
    }
    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(ApiError::Unknown(format!(
        "identity provider HTTP {status}: {}",
        trunc_for_log(&body, 256)
      )));
    }
    Ok(())
  }
}

// --- In-memory variant ---

/// In-memory stand-in. Tokens are registered explicitly (tests, local dev);
/// reset emails and deletions are recorded instead of sent.
#[derive(Clone, Default)]
pub struct MemoryIdentity {
  tokens: Arc<RwLock<HashMap<String, Claims>>>,
  resets: Arc<RwLock<Vec<String>>>,
  deleted: Arc<RwLock<Vec<String>>>,
}

impl MemoryIdentity {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a verifiable token (tests and credential-free local runs).
  #[allow(dead_code)]
  pub async fn register_token(&self, token: &str, claims: Claims) {
    self.tokens.write().await.insert(token.to_string(), claims);
  }

  #[allow(dead_code)]
  pub async fn sent_resets(&self) -> Vec<String> {
    self.resets.read().await.clone()
  }

  #[allow(dead_code)]
  pub async fn deleted_accounts(&self) -> Vec<String> {
    self.deleted.read().await.clone()
  }

  async fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
    self
      .tokens
      .read()
      .await
      .get(token)
      .cloned()
      .ok_or_else(|| ApiError::Auth("Invalid identity token.".into()))
  }

  async fn send_password_reset(&self, email: &str) -> Result<(), ApiError> {
    self.resets.write().await.push(email.to_string());
    Ok(())
  }

  async fn delete_account(&self, uid: &str) -> Result<(), ApiError> {
    self.deleted.write().await.push(uid.to_string());
    Ok(())
  }
}
