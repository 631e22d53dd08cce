//! Periodic job scheduling with graceful shutdown.
//!
//! Each job runs on its own task: serial ticks, a fixed interval measured
//! from the end of one tick to the start of the next (an overrunning tick
//! delays the next one, ticks never overlap), errors and panics logged and
//! swallowed so the schedule survives them.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the worker tasks and the shutdown signal.
pub struct Scheduler {
    token: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_timeout: Duration,
}

impl Scheduler {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Vec::new(),
            shutdown_timeout,
        }
    }

    /// Run `job` every `interval`, starting after `initial_delay`, until
    /// shutdown.
    pub fn spawn<F, Fut>(
        &mut self,
        name: &'static str,
        initial_delay: Duration,
        interval: Duration,
        job: F,
    ) where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let token = self.token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(initial_delay) => {}
            }

            loop {
                match AssertUnwindSafe(job()).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(worker = name, error = %e, "worker tick failed");
                    }
                    Err(_) => {
                        tracing::error!(worker = name, "worker tick panicked");
                    }
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::debug!(worker = name, "worker stopped");
        });
        self.handles.push((name, handle));
    }

    /// Cancel all jobs, letting in-flight ticks finish up to the shutdown
    /// deadline, then abort whatever is left. Does not return until every
    /// task is done.
    pub async fn shutdown(self) {
        self.token.cancel();
        let deadline = tokio::time::Instant::now() + self.shutdown_timeout;

        for (name, handle) in self.handles {
            let abort = handle.abort_handle();
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_panic() => {
                    tracing::error!(worker = name, "worker task panicked during shutdown");
                }
                Ok(Err(_)) => {}
                Err(_) => {
                    tracing::warn!(
                        worker = name,
                        "worker did not stop before the shutdown deadline, aborting"
                    );
                    abort.abort();
                }
            }
        }
    }
}
