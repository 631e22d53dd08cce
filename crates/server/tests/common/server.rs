//! Test server wiring real storage and metadata onto temp directories.

use axum::Router;
use courier_core::config::{AppConfig, MetadataConfig, StorageConfig};
use courier_metadata::{MetadataStore, SqliteStore};
use courier_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;

/// Raw bearer token for the configured test client principal "test-client".
pub const CLIENT_TOKEN: &str = "test-client-token";

/// Raw bearer token for the second configured client, "other-client".
#[allow(dead_code)]
pub const OTHER_CLIENT_TOKEN: &str = "other-client-token";

/// Raw internal service token.
pub const SERVICE_TOKEN: &str = "test-service-token";

pub struct TestServer {
    pub router: Router,
    pub state: AppState,
    /// Concrete store handle for raw-SQL test setup.
    pub store: Arc<SqliteStore>,
    _temp: TempDir,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::for_testing()).await
    }

    /// Build a server from `config`, rehoming storage and metadata onto a
    /// fresh temp directory.
    pub async fn with_config(mut config: AppConfig) -> Self {
        let temp = TempDir::new().expect("failed to create temp directory");

        config.storage = StorageConfig::Filesystem {
            path: temp.path().join("storage"),
        };
        config.metadata = MetadataConfig {
            path: temp.path().join("metadata.db"),
        };

        let storage = courier_storage::from_config(&config.storage)
            .await
            .expect("failed to initialize storage");
        let store = Arc::new(
            SqliteStore::new(&config.metadata.path, config.repository.lock_ttl())
                .await
                .expect("failed to initialize metadata store"),
        );
        let metadata: Arc<dyn MetadataStore> = store.clone();

        let state = AppState::new(config, storage, metadata).expect("failed to build state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            _temp: temp,
        }
    }

    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }
}
