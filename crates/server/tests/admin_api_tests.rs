//! Inspection endpoint tests.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestServer;
use common::fixtures::sample_row;
use common::server::{CLIENT_TOKEN, SERVICE_TOKEN};
use courier_core::SubmissionStatus;
use serde_json::Value;
use tower::ServiceExt;

async fn get(server: &TestServer, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = server.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn listing_filters_by_owner_and_status() {
    let server = TestServer::new().await;
    server
        .metadata()
        .insert(&sample_row("owner-1", "ref-1", SubmissionStatus::Submitted))
        .await
        .unwrap();
    server
        .metadata()
        .insert(&sample_row("owner-1", "ref-2", SubmissionStatus::Forwarded))
        .await
        .unwrap();
    server
        .metadata()
        .insert(&sample_row("owner-2", "ref-3", SubmissionStatus::Submitted))
        .await
        .unwrap();

    let (status, json) = get(
        &server,
        "/dms-submission/submissions?owner=owner-1",
        Some(SERVICE_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["submissions"].as_array().unwrap().len(), 2);

    let (status, json) = get(
        &server,
        "/dms-submission/submissions?status=Submitted",
        Some(SERVICE_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["submissions"].as_array().unwrap().len(), 2);

    let (status, _) = get(
        &server,
        "/dms-submission/submissions?status=NotAStatus",
        Some(SERVICE_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn single_submission_view_carries_the_summary() {
    let server = TestServer::new().await;
    let mut row = sample_row("owner-1", "ref-1", SubmissionStatus::Failed);
    row.failure_reason = Some("rejected".to_string());
    row.failure_count = 2;
    server.metadata().insert(&row).await.unwrap();

    let (status, json) = get(
        &server,
        "/dms-submission/submissions/owner-1/ref-1",
        Some(SERVICE_TOKEN),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Failed");
    assert_eq!(json["failureReason"], "rejected");
    assert_eq!(json["failureCount"], 2);
    assert_eq!(json["locked"], false);
    assert_eq!(
        json["objectSummary"]["location"],
        "corr-owner-1-ref-1.zip"
    );
    assert_eq!(json["objectSummary"]["contentMd5"], "CY9rzUYh03PK3k6DJie09g==");

    let (status, _) = get(
        &server,
        "/dms-submission/submissions/owner-1/ghost",
        Some(SERVICE_TOKEN),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inspection_requires_the_service_token() {
    let server = TestServer::new().await;

    let (status, _) = get(&server, "/dms-submission/submissions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&server, "/dms-submission/submissions", Some(CLIENT_TOKEN)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
