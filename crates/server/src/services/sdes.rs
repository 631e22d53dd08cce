//! SDES file-ready notification client.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use courier_core::config::SdesConfig;
use courier_metadata::models::SubmissionRow;
use serde::Serialize;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from the SDES notification call.
#[derive(Debug, thiserror::Error)]
pub enum SdesError {
    #[error("sdes request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("sdes rejected notification with status {0}")]
    Status(u16),

    #[error("stored content md5 is not valid base64: {0}")]
    BadChecksum(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReadyNotification<'a> {
    information_type: &'a str,
    file: FileDetail<'a>,
    audit: Audit<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileDetail<'a> {
    recipient_or_sender: &'a str,
    name: &'a str,
    location: String,
    checksum: Checksum,
    size: i64,
}

#[derive(Debug, Serialize)]
struct Checksum {
    algorithm: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct Audit<'a> {
    #[serde(rename = "correlationID")]
    correlation_id: &'a str,
}

/// Client for the downstream SDES notification API.
pub struct SdesClient {
    http: reqwest::Client,
    config: SdesConfig,
}

impl SdesClient {
    pub fn new(config: SdesConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Tell SDES the submission's archive is ready for collection.
    pub async fn notify(&self, row: &SubmissionRow) -> Result<(), SdesError> {
        let url = format!(
            "{}/notification/fileready",
            self.config.base_url.trim_end_matches('/')
        );

        // The summary carries the MD5 base64-encoded; SDES wants it in hex.
        let digest = BASE64
            .decode(&row.object_content_md5)
            .map_err(|_| SdesError::BadChecksum(row.object_content_md5.clone()))?;
        let checksum = digest.iter().map(|b| format!("{b:02x}")).collect();

        let body = FileReadyNotification {
            information_type: &self.config.information_type,
            file: FileDetail {
                recipient_or_sender: &self.config.recipient_or_sender,
                name: &row.object_location,
                location: format!(
                    "{}{}",
                    self.config.object_store_location_prefix, row.object_location
                ),
                checksum: Checksum {
                    algorithm: "md5",
                    value: checksum,
                },
                size: row.object_content_length,
            },
            audit: Audit {
                correlation_id: &row.sdes_correlation_id,
            },
        };

        let response = self.http.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SdesError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
