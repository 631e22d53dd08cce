//! Metadata store abstraction and SQLite implementation for courier.
//!
//! This crate provides the control-plane data model:
//! - The durable submission record and its unique keys
//! - Status transitions through the submission lifecycle
//! - The lock-and-replace lease used for single-consumer worker processing
//! - An injected clock so lease TTLs and timestamps are testable

pub mod clock;
pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{MetadataError, MetadataResult};
pub use repos::submissions::{ListQuery, LockOutcome, ReplaceFn, SubmissionRepo};
pub use store::{MetadataStore, SqliteStore};

use courier_core::config::MetadataConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create a metadata store from configuration.
pub async fn from_config(
    config: &MetadataConfig,
    lock_ttl: Duration,
) -> MetadataResult<Arc<dyn MetadataStore>> {
    let store = SqliteStore::new(&config.path, lock_ttl).await?;
    Ok(Arc::new(store) as Arc<dyn MetadataStore>)
}
