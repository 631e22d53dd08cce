//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Accept `localhost` callback hosts in addition to the platform suffix.
    /// Intended for local development only.
    #[serde(default)]
    pub allow_localhost_callbacks: bool,
    /// Maximum accepted size of the uploaded PDF part in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_file_size() -> usize {
    25 * 1024 * 1024 // 25 MiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allow_localhost_callbacks: false,
            max_file_size: default_max_file_size(),
        }
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for submission archives.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/storage"),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// SQLite database file path.
    #[serde(default = "default_metadata_path")]
    pub path: PathBuf,
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("./data/metadata.db")
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: default_metadata_path(),
        }
    }
}

/// Repository tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Maximum time a worker lease may be held before another worker may
    /// forcibly reclaim it. Must exceed the slowest expected SDES/callback
    /// call.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

fn default_lock_ttl_secs() -> u64 {
    30
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            lock_ttl_secs: default_lock_ttl_secs(),
        }
    }
}

impl RepositoryConfig {
    /// Get the lock TTL as a Duration.
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    /// Validate repository configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.lock_ttl_secs == 0 {
            return Err("repository.lock_ttl_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// A single periodic worker's schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between ticks.
    pub interval_secs: u64,
}

impl WorkerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// The failed-item worker's schedule and escalation threshold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedItemWorkerConfig {
    /// Seconds between ticks.
    pub interval_secs: u64,
    /// Callback attempts before an item is promoted to CallbackFailed.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
}

fn default_max_failures() -> u32 {
    3
}

impl FailedItemWorkerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Background worker configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Delay before the first tick of every worker.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    /// Drains Submitted items into SDES notifications.
    #[serde(default = "default_sdes_worker")]
    pub sdes_worker: WorkerConfig,
    /// Drains Processed/Failed items into client callbacks.
    #[serde(default = "default_processed_item_worker")]
    pub processed_item_worker: WorkerConfig,
    /// Promotes callback-exhausted items to CallbackFailed.
    #[serde(default = "default_failed_item_worker")]
    pub failed_item_worker: FailedItemWorkerConfig,
    /// How long shutdown waits for in-flight ticks before aborting them.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_initial_delay_secs() -> u64 {
    1
}

fn default_sdes_worker() -> WorkerConfig {
    WorkerConfig { interval_secs: 30 }
}

fn default_processed_item_worker() -> WorkerConfig {
    WorkerConfig { interval_secs: 30 }
}

fn default_failed_item_worker() -> FailedItemWorkerConfig {
    FailedItemWorkerConfig {
        interval_secs: 60,
        max_failures: default_max_failures(),
    }
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            sdes_worker: default_sdes_worker(),
            processed_item_worker: default_processed_item_worker(),
            failed_item_worker: default_failed_item_worker(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl WorkersConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Validate worker configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.sdes_worker.interval_secs == 0
            || self.processed_item_worker.interval_secs == 0
            || self.failed_item_worker.interval_secs == 0
        {
            return Err("worker intervals cannot be 0".to_string());
        }
        if self.failed_item_worker.max_failures == 0 {
            return Err("workers.failed_item_worker.max_failures must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Downstream SDES service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SdesConfig {
    /// Base URL of the SDES notification API.
    pub base_url: String,
    /// Information type advertised in file-ready notifications.
    pub information_type: String,
    /// Recipient or sender identifier advertised in notifications.
    pub recipient_or_sender: String,
    /// Prefix prepended to object keys so SDES can locate files.
    #[serde(default)]
    pub object_store_location_prefix: String,
    /// Per-call timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl SdesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Outbound client callback configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Per-call timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CallbackConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// External collaborator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub sdes: SdesConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
}

/// A submit-capable client and its pre-hashed bearer token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientTokenConfig {
    /// Principal recorded as the owner of the client's submissions.
    pub principal: String,
    /// SHA256 hex of the client's bearer token.
    /// Generate with: `echo -n "your-secret-token" | sha256sum`
    pub token_hash: String,
}

/// Internal authentication configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InternalAuthConfig {
    /// Service token authorising the SDES status-update endpoint and the
    /// inspection surface.
    pub token: String,
    /// Clients allowed to submit, keyed by token hash.
    #[serde(default)]
    pub clients: Vec<ClientTokenConfig>,
}

impl InternalAuthConfig {
    /// Create a test configuration with dummy tokens.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            token: "test-service-token".to_string(),
            clients: vec![
                ClientTokenConfig {
                    principal: "test-client".to_string(),
                    // SHA256 of "test-client-token"
                    token_hash: "26ace80c6eac526b6537ddfe2f817e61dfc465cd73e206501186d374eb97ca21"
                        .to_string(),
                },
                ClientTokenConfig {
                    principal: "other-client".to_string(),
                    // SHA256 of "other-client-token"
                    token_hash: "bf523c36cb8a00ae968281097608b62a5a9975ef165ef3efef5f47218c22a52e"
                        .to_string(),
                },
            ],
        }
    }

    /// Validate authentication configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.is_empty() {
            return Err("internal_auth.token cannot be empty".to_string());
        }
        for client in &self.clients {
            if client.principal.is_empty() {
                return Err("internal_auth.clients entries require a principal".to_string());
            }
            if client.token_hash.len() != 64
                || !client.token_hash.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(format!(
                    "internal_auth client '{}' token_hash must be 64 hex characters",
                    client.principal
                ));
            }
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Repository tuning.
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Background worker configuration.
    #[serde(default)]
    pub workers: WorkersConfig,
    /// External collaborator configuration (required).
    pub services: ServicesConfig,
    /// Internal authentication configuration (required).
    pub internal_auth: InternalAuthConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage, SQLite metadata, and
    /// dummy auth tokens. The SDES base URL points nowhere useful; tests that
    /// exercise outbound calls override it.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            metadata: MetadataConfig::default(),
            repository: RepositoryConfig::default(),
            workers: WorkersConfig::default(),
            services: ServicesConfig {
                sdes: SdesConfig {
                    base_url: "http://localhost:1".to_string(),
                    information_type: "test-information-type".to_string(),
                    recipient_or_sender: "test-recipient".to_string(),
                    object_store_location_prefix: String::new(),
                    request_timeout_secs: default_request_timeout_secs(),
                },
                callback: CallbackConfig::default(),
            },
            internal_auth: InternalAuthConfig::for_testing(),
        }
    }

    /// Validate the whole configuration. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        self.repository.validate()?;
        self.workers.validate()?;
        self.internal_auth.validate()?;
        if self.services.sdes.base_url.is_empty() {
            return Err("services.sdes.base_url cannot be empty".to_string());
        }
        Ok(())
    }
}
