//! Filesystem backend integration tests.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use courier_storage::{FilesystemBackend, ObjectStore, StorageError};
use md5::{Digest, Md5};
use tempfile::tempdir;

async fn backend() -> (tempfile::TempDir, FilesystemBackend) {
    let temp = tempdir().unwrap();
    let backend = FilesystemBackend::new(temp.path()).await.unwrap();
    (temp, backend)
}

#[tokio::test]
async fn put_reports_length_and_md5() {
    let (_temp, backend) = backend().await;
    let data = Bytes::from_static(b"submission archive bytes");

    let summary = backend.put("abc123.zip", data.clone()).await.unwrap();

    assert_eq!(summary.location, "abc123.zip");
    assert_eq!(summary.content_length, data.len() as i64);
    assert_eq!(summary.content_md5, BASE64.encode(Md5::digest(&data)));

    let roundtrip = backend.get("abc123.zip").await.unwrap();
    assert_eq!(roundtrip, data);
}

#[tokio::test]
async fn head_reports_size() {
    let (_temp, backend) = backend().await;
    backend
        .put("item.zip", Bytes::from_static(b"12345"))
        .await
        .unwrap();

    let meta = backend.head("item.zip").await.unwrap();
    assert_eq!(meta.size, 5);
    assert!(meta.last_modified.is_some());
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let (_temp, backend) = backend().await;
    match backend.get("missing.zip").await {
        Err(StorageError::NotFound(key)) => assert_eq!(key, "missing.zip"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_temp, backend) = backend().await;
    backend
        .put("gone.zip", Bytes::from_static(b"x"))
        .await
        .unwrap();

    backend.delete("gone.zip").await.unwrap();
    assert!(!backend.exists("gone.zip").await.unwrap());

    // Deleting again succeeds.
    backend.delete("gone.zip").await.unwrap();
}

#[tokio::test]
async fn list_filters_by_prefix() {
    let (_temp, backend) = backend().await;
    backend.put("a1.zip", Bytes::from_static(b"1")).await.unwrap();
    backend.put("a2.zip", Bytes::from_static(b"2")).await.unwrap();
    backend.put("b1.zip", Bytes::from_static(b"3")).await.unwrap();

    let keys = backend.list("a").await.unwrap();
    assert_eq!(keys, vec!["a1.zip".to_string(), "a2.zip".to_string()]);

    let all = backend.list("").await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn traversal_keys_are_rejected() {
    let (_temp, backend) = backend().await;
    for key in ["../escape.zip", "/abs.zip", "a/../../b.zip", ""] {
        match backend.put(key, Bytes::from_static(b"x")).await {
            Err(StorageError::InvalidKey(_)) => {}
            other => panic!("expected InvalidKey for {key:?}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn put_overwrites_atomically() {
    let (_temp, backend) = backend().await;
    backend
        .put("item.zip", Bytes::from_static(b"first"))
        .await
        .unwrap();
    backend
        .put("item.zip", Bytes::from_static(b"second"))
        .await
        .unwrap();

    assert_eq!(
        backend.get("item.zip").await.unwrap(),
        Bytes::from_static(b"second")
    );
    // No temp files left behind.
    let keys = backend.list("").await.unwrap();
    assert_eq!(keys, vec!["item.zip".to_string()]);
}
