//! Backend configuration: hosted collaborator endpoints and collection names.
//!
//! Configuration is layered the simple way: an optional TOML file pointed to
//! by BACKEND_CONFIG_PATH supplies defaults, then environment variables
//! override per collaborator. A collaborator with no configuration at all is
//! simply not hosted; the caller falls back to an in-memory stand-in.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BackendConfig {
  #[serde(default)]
  pub collections: Collections,
  #[serde(default)]
  pub document_db: Option<HostedServiceCfg>,
  #[serde(default)]
  pub blob_storage: Option<BlobStorageCfg>,
  #[serde(default)]
  pub identity: Option<HostedServiceCfg>,
}

/// Document-store collection names. Overridable for staging environments that
/// share one database.
#[derive(Clone, Debug, Deserialize)]
pub struct Collections {
  #[serde(default = "default_degrees")]
  pub degrees: String,
  #[serde(default = "default_users")]
  pub users: String,
  #[serde(default = "default_events")]
  pub events: String,
}

fn default_degrees() -> String { "degrees".into() }
fn default_users() -> String { "users".into() }
fn default_events() -> String { "events".into() }

impl Default for Collections {
  fn default() -> Self {
    Self { degrees: default_degrees(), users: default_users(), events: default_events() }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct HostedServiceCfg {
  pub base_url: String,
  pub api_key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlobStorageCfg {
  pub base_url: String,
  pub bucket: String,
  pub api_key: String,
  /// Base of the publicly resolvable object URLs; defaults to the well-known
  /// storage host when absent.
  #[serde(default)]
  pub public_base_url: Option<String>,
}

/// Attempt to load a `BackendConfig` from BACKEND_CONFIG_PATH. On any
/// parsing/IO error, returns None.
fn load_config_file() -> Option<BackendConfig> {
  let path = std::env::var("BACKEND_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<BackendConfig>(&s) {
      Ok(cfg) => {
        info!(target: "academia_backend", %path, "Loaded backend config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "academia_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "academia_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Build the effective configuration: TOML file (if any) + env overrides.
pub fn load_config_from_env() -> BackendConfig {
  let mut cfg = load_config_file().unwrap_or_default();

  if let (Ok(base_url), Ok(api_key)) =
    (std::env::var("DOCDB_BASE_URL"), std::env::var("DOCDB_API_KEY"))
  {
    cfg.document_db = Some(HostedServiceCfg { base_url, api_key });
  }

  if let (Ok(base_url), Ok(bucket), Ok(api_key)) = (
    std::env::var("BLOB_BASE_URL"),
    std::env::var("BLOB_BUCKET"),
    std::env::var("BLOB_API_KEY"),
  ) {
    cfg.blob_storage = Some(BlobStorageCfg {
      base_url,
      bucket,
      api_key,
      public_base_url: std::env::var("BLOB_PUBLIC_BASE_URL").ok(),
    });
  }

  if let (Ok(base_url), Ok(api_key)) =
    (std::env::var("IDENTITY_BASE_URL"), std::env::var("IDENTITY_API_KEY"))
  {
    cfg.identity = Some(HostedServiceCfg { base_url, api_key });
  }

  cfg
}
