//! Outbound client callback notifications.

use courier_core::config::CallbackConfig;
use courier_core::{ObjectSummary, SubmissionStatus};
use courier_metadata::models::SubmissionRow;
use serde::Serialize;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from a callback delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("callback request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("callback endpoint answered status {0}")]
    Status(u16),

    #[error("submission has a corrupt status column: {0}")]
    BadStatus(String),
}

/// Body POSTed to the submitting client's callback URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallbackNotification<'a> {
    id: &'a str,
    status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    object_summary: Option<ObjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<&'a str>,
}

/// Client for terminal-state notifications back to submitting services.
pub struct CallbackClient {
    http: reqwest::Client,
}

impl CallbackClient {
    pub fn new(config: &CallbackConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http })
    }

    /// Deliver the terminal-state notification for `row` to its callback
    /// URL. Only an HTTP 200 counts as delivered.
    pub async fn notify(&self, row: &SubmissionRow) -> Result<(), CallbackError> {
        let status = row
            .status()
            .map_err(|e| CallbackError::BadStatus(e.to_string()))?;

        let body = CallbackNotification {
            id: &row.id,
            status,
            // The archive summary is only meaningful for processed items.
            object_summary: (status == SubmissionStatus::Processed)
                .then(|| row.object_summary()),
            failure_reason: row.failure_reason.as_deref(),
        };

        let response = self
            .http
            .post(&row.callback_url)
            .json(&body)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(CallbackError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
