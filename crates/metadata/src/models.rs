//! Database models mapping to the metadata schema.

use courier_core::{ObjectSummary, SubmissionStatus};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Durable submission record.
///
/// `created_at`, `last_updated` and `locked_at` are owned by the store: the
/// values a caller passes to `insert` are ignored and stamped from the
/// store's clock.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    /// Principal that submitted the item.
    pub owner: String,
    /// Caller-supplied (or generated) submission reference.
    pub id: String,
    /// System-generated id tracking the item across the object store and SDES.
    pub sdes_correlation_id: String,
    /// Where the client wants its terminal-state notification.
    pub callback_url: String,
    /// Current lifecycle state, stored as its string form.
    pub status: String,
    pub object_location: String,
    pub object_content_length: i64,
    pub object_content_md5: String,
    pub object_last_modified: OffsetDateTime,
    /// Diagnostic attached by SDES when it reports a failure.
    pub failure_reason: Option<String>,
    /// Failed client-callback attempts so far.
    pub failure_count: i64,
    /// Non-null while a worker holds the processing lease.
    pub locked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub last_updated: OffsetDateTime,
}

impl SubmissionRow {
    /// Parse the stored status string.
    pub fn status(&self) -> courier_core::Result<SubmissionStatus> {
        SubmissionStatus::parse(&self.status)
    }

    /// Reassemble the object summary from its flattened columns.
    pub fn object_summary(&self) -> ObjectSummary {
        ObjectSummary {
            location: self.object_location.clone(),
            content_length: self.object_content_length,
            content_md5: self.object_content_md5.clone(),
            last_modified: self.object_last_modified,
        }
    }

    /// Return this row with a new status.
    pub fn with_status(mut self, status: SubmissionStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }
}
