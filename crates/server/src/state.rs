//! Application state shared across handlers and workers.

use crate::services::callback::CallbackClient;
use crate::services::sdes::SdesClient;
use anyhow::Context;
use courier_core::config::AppConfig;
use courier_metadata::MetadataStore;
use courier_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Outbound SDES notification client.
    pub sdes: Arc<SdesClient>,
    /// Outbound client callback client.
    pub callback: Arc<CallbackClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Validates the configuration and builds the outbound HTTP clients;
    /// fails fast on either.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("invalid configuration")?;

        let sdes = SdesClient::new(config.services.sdes.clone())
            .context("failed to build SDES client")?;
        let callback = CallbackClient::new(&config.services.callback)
            .context("failed to build callback client")?;

        Ok(Self {
            config: Arc::new(config),
            storage,
            metadata,
            sdes: Arc::new(sdes),
            callback: Arc::new(callback),
        })
    }
}
