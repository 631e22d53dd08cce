//! Submit endpoint integration tests.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestServer;
use common::fixtures::{MULTIPART_BOUNDARY, multipart_body, sample_pdf, valid_fields};
use common::server::CLIENT_TOKEN;
use courier_core::config::AppConfig;
use serde_json::Value;
use tower::ServiceExt;

fn submit_request(body: Vec<u8>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/dms-submission/submit")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(server: &TestServer, request: Request<Body>) -> (StatusCode, Value) {
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

fn error_codes(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["code"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn valid_submission_is_accepted() {
    let server = TestServer::new().await;
    let body = multipart_body(
        &valid_fields("http://callback.mdtp/notify"),
        Some(&sample_pdf()),
    );

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "Submitted");
    let id = json["id"].as_str().unwrap().to_string();

    // The row was recorded against the authenticated principal ...
    let row = server
        .metadata()
        .get("test-client", &id)
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(row.status, "Submitted");
    assert!(row.failure_reason.is_none());
    assert_eq!(row.failure_count, 0);

    // ... and the archive landed in the object store under the correlation id.
    assert_eq!(
        row.object_location,
        format!("{}.zip", row.sdes_correlation_id)
    );
    assert!(
        server
            .state
            .storage
            .exists(&row.object_location)
            .await
            .unwrap()
    );
    assert!(row.object_content_length > 0);
}

#[tokio::test]
async fn caller_supplied_reference_is_kept() {
    let server = TestServer::new().await;
    let mut fields = valid_fields("http://callback.mdtp/notify");
    fields.push(("submissionReference".to_string(), "MY-REF-42".to_string()));
    let body = multipart_body(&fields, Some(&sample_pdf()));

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["id"], "MY-REF-42");
    assert!(
        server
            .metadata()
            .get("test-client", "MY-REF-42")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn duplicate_reference_is_a_conflict() {
    let server = TestServer::new().await;
    let mut fields = valid_fields("http://callback.mdtp/notify");
    fields.push(("submissionReference".to_string(), "DUP-1".to_string()));

    let body = multipart_body(&fields, Some(&sample_pdf()));
    let (status, _) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let body = multipart_body(&fields, Some(&sample_pdf()));
    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "metadata_error");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let server = TestServer::new().await;
    let body = multipart_body(
        &valid_fields("http://callback.mdtp/notify"),
        Some(&sample_pdf()),
    );

    let (status, _) = send(&server, submit_request(body.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&server, submit_request(body, Some("wrong-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_time_of_receipt_is_rejected_by_field() {
    let server = TestServer::new().await;
    let fields: Vec<(String, String)> = valid_fields("http://callback.mdtp/notify")
        .into_iter()
        .map(|(name, value)| {
            if name == "metadata.timeOfReceipt" {
                (name, "foobar".to_string())
            } else {
                (name, value)
            }
        })
        .collect();
    let body = multipart_body(&fields, Some(&sample_pdf()));

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        error_codes(&json)
            .iter()
            .any(|c| c == "metadata.timeOfReceipt.invalid")
    );
}

#[tokio::test]
async fn untrusted_callback_host_is_rejected() {
    let server = TestServer::new().await;
    let body = multipart_body(&valid_fields("http://foo.com/x"), Some(&sample_pdf()));

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_codes(&json), vec!["callbackUrl.invalidHost"]);
}

#[tokio::test]
async fn garbage_callback_url_is_rejected() {
    let server = TestServer::new().await;
    let body = multipart_body(&valid_fields("foobar"), Some(&sample_pdf()));

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_codes(&json), vec!["callbackUrl.invalid"]);
}

#[tokio::test]
async fn localhost_callbacks_follow_the_flag() {
    // Rejected by default.
    let server = TestServer::new().await;
    let body = multipart_body(&valid_fields("http://localhost/cb"), Some(&sample_pdf()));
    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_codes(&json), vec!["callbackUrl.invalidHost"]);

    // Accepted when the configuration allows it.
    let mut config = AppConfig::for_testing();
    config.server.allow_localhost_callbacks = true;
    let server = TestServer::with_config(config).await;
    let body = multipart_body(&valid_fields("http://localhost/cb"), Some(&sample_pdf()));
    let (status, _) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn missing_file_part_is_rejected() {
    let server = TestServer::new().await;
    let body = multipart_body(&valid_fields("http://callback.mdtp/notify"), None);

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_codes(&json), vec!["form.required"]);
}

#[tokio::test]
async fn field_errors_accumulate() {
    let server = TestServer::new().await;
    let fields: Vec<(String, String)> = valid_fields("foobar")
        .into_iter()
        .filter(|(name, _)| name != "metadata.source")
        .collect();
    let body = multipart_body(&fields, None);

    let (status, json) = send(&server, submit_request(body, Some(CLIENT_TOKEN))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let codes = error_codes(&json);
    assert!(codes.contains(&"callbackUrl.invalid".to_string()));
    assert!(codes.contains(&"metadata.source.required".to_string()));
    assert!(codes.contains(&"form.required".to_string()));
}

#[tokio::test]
async fn health_check_is_open() {
    let server = TestServer::new().await;
    let request = Request::builder()
        .method("GET")
        .uri("/v1/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&server, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}
