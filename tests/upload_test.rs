//! Upload orchestration integration tests.
//!
//! Uploads bypass the JSON envelope: these tests assert on the raw request
//! the orchestrator builds (destination URL, headers, query string, body)
//! and on the pre-network validation failures.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use zenfolio::{
    ClientConfig, HttpMethod, UploadKind, UploadOptions, ZenfolioClient, ZenfolioError,
};

use common::{header_value, MockTransport};

const AUTH_TOKEN: &str = "this-is-the-auth-token";
// SHA-1("LoadPhotoSet")
const LOAD_PHOTO_SET_ID: &str = "f7f34fd95e7fcf07846e1efd35523b9cfcfb0bcb";

fn client_with_mock() -> (ZenfolioClient, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let config = ClientConfig::new("Testing zenfolio-rs").unwrap();
    let client = ZenfolioClient::with_transport(config, transport.clone());
    (client, transport)
}

fn photo_fixture(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn photoset_json() -> String {
    json!({
        "$type": "PhotoSet",
        "Id": 12345,
        "UploadUrl": "https://up.zenfolio.com/12345/photo",
        "VideoUploadUrl": "https://up.zenfolio.com/12345/video",
        "RawUploadUrl": "https://up.zenfolio.com/12345/raw"
    })
    .to_string()
}

#[tokio::test]
async fn missing_file_fails_before_any_network_activity() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;

    let err = client
        .upload(
            "https://up.zenfolio.com/x",
            "/no/such/file.jpg",
            UploadOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ZenfolioError::InvalidArgument(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_network_activity() {
    let (client, transport) = client_with_mock();
    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "photo.jpg", b"jpeg-bytes");

    let err = client
        .upload("https://up.zenfolio.com/x", &file, UploadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ZenfolioError::InvalidArgument(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn upload_to_literal_url_streams_raw_bytes() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;
    transport.push_json("1234567890");

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "photo.jpg", b"jpeg-bytes");

    let response = client
        .upload(
            "https://up.zenfolio.com/12345/photo",
            &file,
            UploadOptions::default(),
        )
        .await
        .unwrap();

    // The response body comes back un-decoded
    assert_eq!(response, "1234567890");

    let requests = transport.recorded();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "https://up.zenfolio.com/12345/photo");
    assert_eq!(&request.body[..], b"jpeg-bytes");

    assert_eq!(header_value(request, "Content-Type"), Some("image/jpeg"));
    // Content-Length comes from the body; the orchestrator never sets it
    assert_eq!(header_value(request, "Content-Length"), None);
    assert_eq!(header_value(request, "X-Zenfolio-Token"), Some(AUTH_TOKEN));
    assert!(header_value(request, "User-Agent").is_some());

    // Query carries the url-encoded filename, defaulting to the base name
    assert!(request
        .query
        .iter()
        .any(|(k, v)| k == "filename" && v == "photo.jpg"));
}

#[tokio::test]
async fn filename_option_is_rfc3986_encoded() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;
    transport.push_json("");

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "photo.jpg", b"jpeg-bytes");

    client
        .upload(
            "https://up.zenfolio.com/12345/photo",
            &file,
            UploadOptions {
                filename: Some("my holiday photo.jpg".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let requests = transport.recorded();
    assert!(requests[0]
        .query
        .iter()
        .any(|(k, v)| k == "filename" && v == "my%20holiday%20photo.jpg" && !v.contains("%25")));
}

#[tokio::test]
async fn modified_option_adds_a_query_parameter() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;
    transport.push_json("");

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "photo.jpg", b"jpeg-bytes");

    let modified = Utc.with_ymd_and_hms(2016, 5, 1, 12, 30, 0).unwrap();
    client
        .upload(
            "https://up.zenfolio.com/12345/photo",
            &file,
            UploadOptions {
                modified: Some(modified),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Encoded like the filename; the transport appends it verbatim
    let requests = transport.recorded();
    assert!(requests[0]
        .query
        .iter()
        .any(|(k, v)| k == "modified" && v.starts_with("2016-05-01T12%3A30%3A00")));
}

#[tokio::test]
async fn photoset_object_target_skips_the_lookup_call() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;
    transport.push_json("");

    let photoset: zenfolio::PhotoSet = serde_json::from_str(&photoset_json()).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "clip.mp4", b"mp4-bytes");

    client
        .upload(
            photoset,
            &file,
            UploadOptions {
                kind: UploadKind::Video,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let requests = transport.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://up.zenfolio.com/12345/video");
}

#[tokio::test]
async fn numeric_target_resolves_via_a_shallow_photoset_load() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;
    transport.push_json(&format!(
        r#"{{"error":null,"id":"{LOAD_PHOTO_SET_ID}","result":{}}}"#,
        photoset_json()
    ));
    transport.push_json("");

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "scan.tiff", b"tiff-bytes");

    client
        .upload(
            12345i64,
            &file,
            UploadOptions {
                kind: UploadKind::Raw,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let requests = transport.recorded();
    assert_eq!(requests.len(), 2);

    let lookup: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(lookup["method"], "LoadPhotoSet");
    assert_eq!(lookup["params"], json!([12345, "Level1", false]));

    assert_eq!(requests[1].url, "https://up.zenfolio.com/12345/raw");
    assert_eq!(header_value(&requests[1], "Content-Type"), Some("image/tiff"));
}

#[tokio::test]
async fn use_put_switches_the_http_method() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;
    transport.push_json("");

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "photo.jpg", b"jpeg-bytes");

    client
        .upload(
            "https://up.zenfolio.com/12345/photo",
            &file,
            UploadOptions {
                use_put: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let requests = transport.recorded();
    assert_eq!(requests[0].method, HttpMethod::Put);
}

#[tokio::test]
async fn missing_upload_url_for_requested_kind_is_invalid_argument() {
    let (client, transport) = client_with_mock();
    client.set_auth_token(AUTH_TOKEN).await;

    let photoset: zenfolio::PhotoSet = serde_json::from_str(
        &json!({"$type": "PhotoSet", "Id": 7, "UploadUrl": "https://up.zenfolio.com/7/photo"})
            .to_string(),
    )
    .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let file = photo_fixture(&dir, "clip.mp4", b"mp4-bytes");

    let err = client
        .upload(
            photoset,
            &file,
            UploadOptions {
                kind: UploadKind::Video,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ZenfolioError::InvalidArgument(_)));
    assert_eq!(transport.request_count(), 0);
}
