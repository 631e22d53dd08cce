//! Object storage abstraction and backends for courier.
//!
//! Submission archives are written once at `{correlationId}.zip` and owned
//! by that submission for life. The store reports back the summary
//! (location, size, MD5, timestamp) that the rest of the pipeline records
//! and forwards to SDES.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{ObjectMeta, ObjectStore};

use courier_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
