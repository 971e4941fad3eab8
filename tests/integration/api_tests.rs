//! API integration tests for uploads and error handling.
//!
//! Tests verify:
//! - Uploads are stored under fresh names and answered with a link
//! - Stored images are scrubbed according to the allow-list
//! - Non-image uploads are stored byte for byte
//! - Error cases (missing field, unscrubbable image, oversized body)
//! - HTTP response codes and headers

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;

use jaf::{
    create_router, ByteOrder, ExifScrubber, FileNameRegistry, RouterConfig, UploadService,
    UploadSettings,
};

use super::test_utils::{camera_jpeg, camera_png, decodes, exif_tag_paths};

const BOUNDARY: &str = "jaf-test-boundary";
const LINK_PREFIX: &str = "https://jaf.example.com/";

// =============================================================================
// Helpers
// =============================================================================

fn settings(dir: &Path) -> UploadSettings {
    UploadSettings {
        file_dir: dir.to_path_buf(),
        link_prefix: LINK_PREFIX.to_string(),
        link_length: 5,
        scrub_exif: true,
        exif_abort_on_error: true,
    }
}

fn router_with(settings: UploadSettings, config: RouterConfig) -> Router {
    let scrubber = ExifScrubber::new(
        [0x9209],
        [
            "IFD/Orientation",
            "IFD/GPSInfo/GPSTimeStamp",
            "IFD/GPSInfo/GPSDateStamp",
        ],
    );
    let service = UploadService::new(settings, scrubber, FileNameRegistry::new());
    create_router(service, config.with_tracing(false))
}

fn test_router(dir: &Path) -> Router {
    router_with(settings(dir), RouterConfig::default())
}

/// Build a multipart body with one part.
fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, file_name, data)))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Resolve a returned link to the stored file.
fn stored_file(dir: &Path, link: &str) -> Vec<u8> {
    let name = link.strip_prefix(LINK_PREFIX).expect("link has the prefix");
    std::fs::read(dir.join(name)).unwrap()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Successful Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_jpeg_is_scrubbed() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .oneshot(upload_request(
            "file",
            "IMG_0001.jpg",
            &camera_jpeg(ByteOrder::LittleEndian),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let link = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(link.starts_with(LINK_PREFIX));
    assert!(link.ends_with(".jpg"));
    assert_eq!(link.len(), LINK_PREFIX.len() + 5 + ".jpg".len());

    let stored = stored_file(dir.path(), &link);
    assert!(decodes(&stored));
    assert_eq!(
        exif_tag_paths(&stored).unwrap(),
        vec![
            "IFD/Orientation",
            "IFD/Exif/Flash",
            "IFD/GPSInfo/GPSTimeStamp",
            "IFD/GPSInfo/GPSDateStamp",
        ]
    );
}

#[tokio::test]
async fn test_upload_png_without_name_gets_sniffed_extension() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .oneshot(upload_request(
            "file",
            "screenshot",
            &camera_png(ByteOrder::BigEndian),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let link = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(link.ends_with(".png"));

    let stored = stored_file(dir.path(), &link);
    assert_eq!(exif_tag_paths(&stored).unwrap().len(), 4);
}

#[tokio::test]
async fn test_upload_text_is_stored_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let content = b"just some notes\n";
    let response = router
        .oneshot(upload_request("file", "notes.txt", content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let link = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(link.ends_with(".txt"));
    assert_eq!(stored_file(dir.path(), &link), content);
}

#[tokio::test]
async fn test_scrub_disabled_stores_original() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.scrub_exif = false;
    let router = router_with(settings, RouterConfig::default());

    let image = camera_jpeg(ByteOrder::LittleEndian);
    let response = router
        .oneshot(upload_request("file", "photo.jpg", &image))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let link = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert_eq!(stored_file(dir.path(), &link), image);
}

#[tokio::test]
async fn test_concurrent_uploads_get_distinct_names() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let mut handles = Vec::new();
    for i in 0..20 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let content = format!("upload number {}", i);
            let response = router
                .oneshot(upload_request("file", "a.txt", content.as_bytes()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
        }));
    }

    let mut links = Vec::new();
    for handle in handles {
        links.push(handle.await.unwrap());
    }
    links.sort();
    links.dedup();

    assert_eq!(links.len(), 20);
    assert_eq!(file_count(dir.path()), 20);
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_missing_file_field() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .oneshot(upload_request("attachment", "photo.jpg", b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(json["status"], 400);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_not_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_unscrubbable_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let mut image = camera_jpeg(ByteOrder::LittleEndian).to_vec();
    image[12] = b'X';
    image[13] = b'X';

    let response = router
        .oneshot(upload_request("file", "photo.jpg", &image))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "scrub_failed");
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_unscrubbable_image_stored_when_not_aborting() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.exif_abort_on_error = false;
    let router = router_with(settings, RouterConfig::default());

    let mut image = camera_jpeg(ByteOrder::LittleEndian).to_vec();
    image[12] = b'X';
    image[13] = b'X';

    let response = router
        .oneshot(upload_request("file", "photo.jpg", &image))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let link = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert_eq!(stored_file(dir.path(), &link), image);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = router_with(
        settings(dir.path()),
        RouterConfig::default().with_max_upload_size(1024),
    );

    let response = router
        .oneshot(upload_request("file", "big.bin", &vec![0x42; 64 * 1024]))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_unknown_route() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let request = Request::builder()
        .uri("/files/abcde.jpg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
