//! Promotes callback-exhausted items to their terminal failed state.

use crate::state::AppState;

/// One tick: move every Processed/Failed item whose callback has failed
/// `max_failures` times to CallbackFailed. Operators inspect those
/// out-of-band; the callback worker never sees them again.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let max_failures = i64::from(state.config.workers.failed_item_worker.max_failures);
    let promoted = state.metadata.mark_callback_failed(max_failures).await?;
    if promoted > 0 {
        tracing::warn!(
            count = promoted,
            max_failures,
            "submissions exhausted their callback retries"
        );
    }
    Ok(())
}
