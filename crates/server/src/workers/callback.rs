//! Notifies submitting clients of terminal SDES outcomes.

use crate::state::AppState;
use courier_core::SubmissionStatus;
use courier_metadata::LockOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One tick: drain the Processed queue, then the Failed queue.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    drain_queue(&state, SubmissionStatus::Processed).await;
    drain_queue(&state, SubmissionStatus::Failed).await;
    Ok(())
}

/// Lease items in `status` oldest-first and POST each to its callback URL.
///
/// A delivered callback (HTTP 200) completes the item. A failed delivery
/// commits the item back with `failure_count + 1` and the same status,
/// which re-stamps `last_updated` and sends it to the back of the queue;
/// the drain stops there so an unreachable client cannot spin the tick.
async fn drain_queue(state: &AppState, status: SubmissionStatus) {
    loop {
        let callback = state.callback.clone();
        let delivered = Arc::new(AtomicBool::new(false));
        let delivered_flag = delivered.clone();

        let outcome = state
            .metadata
            .lock_and_replace_oldest_by_status(
                status,
                Box::new(move |row| {
                    Box::pin(async move {
                        match callback.notify(&row).await {
                            Ok(()) => {
                                delivered_flag.store(true, Ordering::SeqCst);
                                tracing::info!(
                                    owner = %row.owner,
                                    id = %row.id,
                                    "client callback delivered"
                                );
                                Ok(row.with_status(SubmissionStatus::Completed))
                            }
                            Err(e) => {
                                tracing::warn!(
                                    owner = %row.owner,
                                    id = %row.id,
                                    attempts = row.failure_count + 1,
                                    error = %e,
                                    "client callback failed"
                                );
                                let mut row = row;
                                row.failure_count += 1;
                                Ok(row)
                            }
                        }
                    })
                }),
            )
            .await;

        match outcome {
            Ok(LockOutcome::Found) if delivered.load(Ordering::SeqCst) => continue,
            Ok(LockOutcome::Found) => break,
            Ok(LockOutcome::NotFound) => break,
            Err(e) => {
                tracing::warn!(status = %status, error = %e, "callback drain stopped");
                break;
            }
        }
    }
}
