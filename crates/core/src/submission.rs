//! Submission lifecycle types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle state of a submission.
///
/// Transitions form a DAG; nothing ever moves back to an earlier state:
///
/// ```text
/// Submitted -> Forwarded -> {Processed, Failed} -> Completed
///                           {Processed, Failed} -> CallbackFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    /// Accepted by the submit endpoint; archive uploaded, SDES not yet told.
    Submitted,
    /// SDES has been notified that the file is ready.
    Forwarded,
    /// SDES reported the file as processed; client callback pending.
    Processed,
    /// SDES reported the file as failed; client callback pending.
    Failed,
    /// Client callback delivered.
    Completed,
    /// Client callback retries exhausted; needs operator attention.
    CallbackFailed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Forwarded => "Forwarded",
            Self::Processed => "Processed",
            Self::Failed => "Failed",
            Self::Completed => "Completed",
            Self::CallbackFailed => "CallbackFailed",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Submitted" => Ok(Self::Submitted),
            "Forwarded" => Ok(Self::Forwarded),
            "Processed" => Ok(Self::Processed),
            "Failed" => Ok(Self::Failed),
            "Completed" => Ok(Self::Completed),
            "CallbackFailed" => Ok(Self::CallbackFailed),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Forwarded)
                | (Self::Forwarded, Self::Processed)
                | (Self::Forwarded, Self::Failed)
                | (Self::Processed, Self::Completed)
                | (Self::Processed, Self::CallbackFailed)
                | (Self::Failed, Self::Completed)
                | (Self::Failed, Self::CallbackFailed)
        )
    }

    /// Terminal states are retained for audit and never move again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::CallbackFailed)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an uploaded submission archive landed in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Key of the object relative to the store root.
    pub location: String,
    /// Size of the stored object in bytes.
    pub content_length: i64,
    /// Base64-encoded MD5 digest of the stored object.
    pub content_md5: String,
    /// When the object was written.
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

/// Routing metadata captured from a submit request.
///
/// Every string field is required and non-empty; validation happens at the
/// HTTP boundary before this type is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    pub store: bool,
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time_of_receipt: OffsetDateTime,
    pub form_id: String,
    pub customer_id: String,
    pub submission_mark: String,
    pub cas_key: String,
    pub classification_type: String,
    pub business_area: String,
}
