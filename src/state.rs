//! Application state: configuration plus the three hosted collaborators
//! (document store, blob storage, identity provider).
//!
//! Collaborators are initialized once at startup and injected into handlers
//! through `axum::extract::State`, so tests can substitute the in-memory
//! variants. A collaborator without credentials degrades to its in-memory
//! stand-in with a warning, which keeps local development credential-free.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::blobs::{BlobStore, HostedBlobStore, MemoryBlobStore};
use crate::config::{load_config_from_env, BackendConfig};
use crate::identity::{HostedIdentity, IdentityProvider, MemoryIdentity};
use crate::store::{HostedStore, MemoryStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: BackendConfig,
    pub store: Arc<Store>,
    pub blobs: Arc<BlobStore>,
    pub identity: Arc<IdentityProvider>,
    // Per-user serialization point for purchased-course read-modify-write;
    // the store only guarantees single-document write atomicity.
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AppState {
    /// Build state from env: load config and construct collaborators.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_config_from_env();

        let store = match config.document_db.as_ref().and_then(HostedStore::new) {
            Some(hosted) => {
                info!(target: "academia_backend", "Document store enabled (hosted)");
                Store::Hosted(hosted)
            }
            None => {
                warn!(target: "academia_backend", "No document-db credentials; using in-memory store");
                Store::Memory(MemoryStore::new())
            }
        };

        let blobs = match config.blob_storage.as_ref().and_then(HostedBlobStore::new) {
            Some(hosted) => {
                info!(target: "academia_backend", "Blob storage enabled (hosted)");
                BlobStore::Hosted(hosted)
            }
            None => {
                warn!(target: "academia_backend", "No blob-storage credentials; using in-memory store");
                BlobStore::Memory(MemoryBlobStore::new())
            }
        };

        let identity = match config.identity.as_ref().and_then(HostedIdentity::new) {
            Some(hosted) => {
                info!(target: "academia_backend", "Identity provider enabled (hosted)");
                IdentityProvider::Hosted(hosted)
            }
            None => {
                warn!(target: "academia_backend", "No identity-provider credentials; using in-memory provider");
                IdentityProvider::Memory(MemoryIdentity::new())
            }
        };

        Self::with_collaborators(config, store, blobs, identity)
    }

    /// Assemble state from explicit collaborators (tests inject fakes here).
    pub fn with_collaborators(
        config: BackendConfig,
        store: Store,
        blobs: BlobStore,
        identity: IdentityProvider,
    ) -> Self {
        Self {
            config,
            store: Arc::new(store),
            blobs: Arc::new(blobs),
            identity: Arc::new(identity),
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get-or-create the serialization lock for one user's document.
    pub async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// State wired entirely to in-memory collaborators, returned alongside
    /// handles to them so tests can seed and inspect.
    pub(crate) fn memory_state() -> (AppState, MemoryStore, MemoryBlobStore, MemoryIdentity) {
        let store = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let identity = MemoryIdentity::new();
        let state = AppState::with_collaborators(
            BackendConfig::default(),
            Store::Memory(store.clone()),
            BlobStore::Memory(blobs.clone()),
            IdentityProvider::Memory(identity.clone()),
        );
        (state, store, blobs, identity)
    }
}
