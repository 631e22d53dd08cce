//! Forwards newly submitted items to SDES.

use crate::state::AppState;
use courier_core::SubmissionStatus;
use courier_metadata::LockOutcome;

/// One tick: drain Submitted items oldest-first, notifying SDES for each
/// and advancing it to Forwarded. A failed notification leaves the item
/// Submitted (lease released) and ends the tick; the next tick retries it.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    loop {
        let sdes = state.sdes.clone();
        let outcome = state
            .metadata
            .lock_and_replace_oldest_by_status(
                SubmissionStatus::Submitted,
                Box::new(move |row| {
                    Box::pin(async move {
                        sdes.notify(&row).await?;
                        tracing::info!(
                            owner = %row.owner,
                            id = %row.id,
                            correlation_id = %row.sdes_correlation_id,
                            "submission forwarded to SDES"
                        );
                        Ok(row.with_status(SubmissionStatus::Forwarded))
                    })
                }),
            )
            .await;

        match outcome {
            Ok(LockOutcome::Found) => continue,
            Ok(LockOutcome::NotFound) => break,
            Err(e) => {
                tracing::warn!(error = %e, "SDES notification failed, submission left for retry");
                break;
            }
        }
    }
    Ok(())
}
