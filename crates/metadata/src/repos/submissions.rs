//! Submission repository trait.

use crate::error::MetadataResult;
use crate::models::SubmissionRow;
use async_trait::async_trait;
use courier_core::SubmissionStatus;
use futures::future::BoxFuture;
use time::OffsetDateTime;

/// Replacement callback invoked while a row lease is held.
///
/// The future may suspend (SDES calls, client callbacks); the lease stays
/// held across the suspension and is released when the store commits or
/// rolls back.
pub type ReplaceFn =
    Box<dyn FnOnce(SubmissionRow) -> BoxFuture<'static, anyhow::Result<SubmissionRow>> + Send>;

/// Outcome of a lock-and-replace attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// A row was leased and replaced.
    Found,
    /// No eligible row (none in the status, or all currently leased).
    NotFound,
}

/// Filters for the inspection listing.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub owner: Option<String>,
    pub status: Option<SubmissionStatus>,
    pub created_before: Option<OffsetDateTime>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            owner: None,
            status: None,
            created_before: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Repository for durable submission records.
#[async_trait]
pub trait SubmissionRepo: Send + Sync {
    /// Insert a new submission.
    ///
    /// Rejects with `AlreadyExists` if the `(owner, id)` pair or the
    /// correlation id is already present. Stamps `created_at` and
    /// `last_updated` from the store clock.
    async fn insert(&self, row: &SubmissionRow) -> MetadataResult<()>;

    /// Get a submission by its owner and reference.
    async fn get(&self, owner: &str, id: &str) -> MetadataResult<Option<SubmissionRow>>;

    /// Get a submission by its SDES correlation id.
    async fn get_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> MetadataResult<Option<SubmissionRow>>;

    /// List submissions for inspection, newest first.
    async fn list(&self, query: &ListQuery) -> MetadataResult<Vec<SubmissionRow>>;

    /// Transition a submission identified by `(owner, id)`.
    ///
    /// Fails with `NotFound` when no row matches and
    /// `InvalidStateTransition` when the lifecycle forbids the move.
    /// `failure_reason: None` removes any stored reason; `Some` replaces it.
    /// Stamps `last_updated`.
    async fn update(
        &self,
        owner: &str,
        id: &str,
        status: SubmissionStatus,
        failure_reason: Option<String>,
    ) -> MetadataResult<SubmissionRow>;

    /// Transition a submission identified by its correlation id.
    /// Same contract as [`SubmissionRepo::update`].
    async fn update_by_correlation_id(
        &self,
        correlation_id: &str,
        status: SubmissionStatus,
        failure_reason: Option<String>,
    ) -> MetadataResult<SubmissionRow>;

    /// Delete a submission. Succeeds whether or not the row exists.
    async fn remove(&self, owner: &str, id: &str) -> MetadataResult<()>;

    /// Lease the oldest unlocked row in `status` and replace it with the
    /// result of `f`.
    ///
    /// Selection skips rows whose lease is younger than the lock TTL; the
    /// lease itself is taken with a compare-and-swap on `last_updated` so two
    /// workers racing for the same row cannot both win (the loser sees
    /// `NotFound` and waits for its next tick). On success the row is
    /// replaced, the lease cleared and `last_updated` stamped. If `f` fails
    /// the lease is cleared, the row is otherwise untouched, and the error is
    /// propagated as `MetadataError::Replace`.
    async fn lock_and_replace_oldest_by_status(
        &self,
        status: SubmissionStatus,
        f: ReplaceFn,
    ) -> MetadataResult<LockOutcome>;

    /// Promote every unleased Processed/Failed row with at least
    /// `max_failures` failed callback attempts to CallbackFailed.
    /// Returns the number promoted.
    async fn mark_callback_failed(&self, max_failures: i64) -> MetadataResult<u64>;
}
