use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use media_upload_server::config::MediaConfig;
use media_upload_server::services::storage::LocalStorageService;
use media_upload_server::utils::hash::EMPTY_FINGERPRINT;
use media_upload_server::{AppState, create_app};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----media-test-boundary";
const ACK: &str = "Physical media file deletion request processed.";

struct Part<'a> {
    field: &'a str,
    filename: Option<&'a str>,
    content_type: &'a str,
    data: &'a [u8],
}

fn file<'a>(field: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        field,
        filename: Some(filename),
        content_type,
        data,
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    part.field, name, part.content_type
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.field
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn delete_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri("/api/media")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn setup_with(configure: impl FnOnce(&mut MediaConfig)) -> (TempDir, Router) {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = MediaConfig::development(tmp.path());
    configure(&mut config);
    let storage = Arc::new(LocalStorageService::new(tmp.path()));
    let app = create_app(AppState::new(storage, config));
    (tmp, app)
}

fn setup() -> (TempDir, Router) {
    setup_with(|_| {})
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn staged_count(root: &Path) -> usize {
    std::fs::read_dir(root.join("temp"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

fn stored_files(root: &Path) -> Vec<PathBuf> {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if path.file_name().is_some_and(|n| n == "temp") {
                    continue;
                }
                walk(&path, out);
            } else {
                out.push(path);
            }
        }
    }
    let mut out = Vec::new();
    walk(root, &mut out);
    out
}

#[tokio::test]
async fn test_upload_helloworld_to_shared_folder() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=client-hash",
            &[file("file", "helloworld", "image/png", b"helloworld")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let url = body["url"].as_str().unwrap();
    let filename = body["filename"].as_str().unwrap();
    assert!(url.starts_with("uploads/media/shared/logo/"));
    assert_eq!(url, format!("uploads/media/shared/logo/{}", filename));

    let (ts, name) = filename.split_once('-').unwrap();
    assert!(ts.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(name, "helloworld");

    assert_eq!(body["size"], 10);
    assert_eq!(body["mimeType"], "image/png");
    assert_eq!(body["hash"], "client-hash");

    let stored = tmp.path().join("media/shared/logo").join(filename);
    assert_eq!(std::fs::read(stored).unwrap(), b"helloworld");
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_with_tenant_uses_tenant_folder() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?restaurantId=42&type=%20gallery%20&hash=h",
            &[file("file", "front door.jpg", "image/jpeg", b"\xff\xd8\xff\xe0jpeg")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("uploads/restaurant_42/gallery/"));
    assert!(url.ends_with("-front_door.jpg"));

    let stored = tmp
        .path()
        .join("restaurant_42/gallery")
        .join(body["filename"].as_str().unwrap());
    assert_eq!(std::fs::read(stored).unwrap(), b"\xff\xd8\xff\xe0jpeg");
}

#[tokio::test]
async fn test_upload_without_type_is_rejected_and_cleaned_up() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?hash=abc",
            &[file("file", "helloworld", "image/png", b"helloworld")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing type or hash in query");
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_without_hash_is_rejected() {
    let (tmp, app) = setup();

    let (status, _) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo",
            &[file("file", "a.png", "image/png", b"png")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_rejects_path_segments() {
    let (tmp, app) = setup();

    let (status, _) = send(
        &app,
        upload_request(
            "/api/media/upload?type=..%2F..%2Fetc&hash=h",
            &[file("file", "a.png", "image/png", b"png")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_rejects_unsupported_type() {
    let (tmp, app) = setup();

    let (status, _) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=h",
            &[file("file", "doc.pdf", "application/pdf", b"%PDF-1.7")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_without_file() {
    let (_tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=h",
            &[Part {
                field: "note",
                filename: None,
                content_type: "text/plain",
                data: b"just text",
            }],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let (tmp, app) = setup_with(|c| c.max_file_size = 8);

    let (status, _) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=h",
            &[file("file", "big.gif", "image/gif", b"0123456789abcdef")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_verified_hash_must_match() {
    let (tmp, app) = setup_with(|c| c.verify_client_hash = true);

    let (status, _) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=123",
            &[file("file", "helloworld", "image/png", b"helloworld")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stored_files(tmp.path()).is_empty());

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=9228181307863624271",
            &[file("file", "helloworld", "image/png", b"helloworld")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["hash"], "9228181307863624271");
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_hash_of_empty_file() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/hash",
            &[file("file", "empty.png", "image/png", b"")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hash"], EMPTY_FINGERPRINT);
    assert_eq!(body["size"], 0);
    assert_eq!(body["filename"], "empty.png");
    assert_eq!(body["mimeType"], "image/png");
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_hash_is_deterministic_and_content_sensitive() {
    let (_tmp, app) = setup();

    let mut hashes = Vec::new();
    for data in [&b"helloworld"[..], &b"helloworld"[..], &b"helloworlD"[..]] {
        let (status, body) = send(
            &app,
            upload_request("/api/media/hash", &[file("file", "x.png", "image/png", data)]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        hashes.push(body["hash"].as_str().unwrap().to_string());
    }

    assert_eq!(hashes[0], "9228181307863624271");
    assert_eq!(hashes[0], hashes[1]);
    assert_ne!(hashes[0], hashes[2]);
}

#[tokio::test]
async fn test_upload_multiple_with_partial_failure() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload-multiple?type=logo&restaurantId=7",
            &[
                file("files", "one.png", "image/png", b"first"),
                file("files", "notes.txt", "text/plain", b"not media"),
                file("files", "clip.mp4", "video/mp4", b"second"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["succeededCount"], 2);
    assert_eq!(body["failedCount"], 1);
    assert_eq!(body["message"], "2 files uploaded, 1 failed.");

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["type"], "logo");
    assert!(results[0]["url"]
        .as_str()
        .unwrap()
        .starts_with("uploads/restaurant_7/logo/"));
    assert!(results[0]["hash"].as_str().is_some());

    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["filename"], "notes.txt");
    assert!(results[1]["error"].as_str().is_some());
    assert!(results[1].get("url").is_none());

    assert_eq!(results[2]["success"], true);
    assert_eq!(results[2]["mimeType"], "video/mp4");

    assert_eq!(stored_files(tmp.path()).len(), 2);
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_multiple_without_type_cleans_up() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload-multiple",
            &[
                file("files", "one.png", "image/png", b"first"),
                file("files", "two.png", "image/png", b"second"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing type");
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_multiple_limit() {
    let (tmp, app) = setup_with(|c| c.max_files_per_request = 2);

    let (status, _) = send(
        &app,
        upload_request(
            "/api/media/upload-multiple?type=logo",
            &[
                file("files", "1.png", "image/png", b"1"),
                file("files", "2.png", "image/png", b"2"),
                file("files", "3.png", "image/png", b"3"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stored_files(tmp.path()).is_empty());
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_upload_multiple_without_files() {
    let (_tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload-multiple?type=logo",
            &[file("file", "wrong-field.png", "image/png", b"x")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No files uploaded");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=h",
            &[file("file", "logo.png", "image/png", b"png")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let url = body["url"].as_str().unwrap().to_string();
    assert_eq!(stored_files(tmp.path()).len(), 1);

    let payload = serde_json::json!({ "url": url }).to_string();
    let (status, first) = send(&app, delete_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], ACK);
    assert!(stored_files(tmp.path()).is_empty());

    let (status, second) = send(&app, delete_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_delete_unknown_path_acknowledges() {
    let (_tmp, app) = setup();

    let (status, body) = send(
        &app,
        delete_request(r#"{"url": "uploads/media/shared/logo/never-existed.png"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], ACK);
}

#[tokio::test]
async fn test_delete_via_post_alias() {
    let (_tmp, app) = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/api/media/delete")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"url": "restaurant_1/logo/x.png"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], ACK);
}

#[tokio::test]
async fn test_delete_requires_contained_url() {
    let (_tmp, app) = setup();

    let (status, _) = send(&app, delete_request(r#"{"url": ""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, delete_request(r#"{}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let payload = serde_json::json!({ "url": "uploads/../keep-me.txt" }).to_string();
    let (status, _) = send(&app, delete_request(&payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, delete_request(r#"{"url": "/etc/../../passwd"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_cannot_reach_staged_files() {
    let (tmp, app) = setup();
    let staged = tmp.path().join("temp/1700000000000-abc123-inflight.png");
    std::fs::create_dir_all(staged.parent().unwrap()).unwrap();
    std::fs::write(&staged, b"in flight").unwrap();

    let payload =
        serde_json::json!({ "url": "uploads/temp/1700000000000-abc123-inflight.png" }).to_string();
    let (status, _) = send(&app, delete_request(&payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(staged.exists());
}

#[tokio::test]
async fn test_oversized_request_body_is_payload_too_large() {
    let (tmp, app) = setup_with(|c| {
        c.max_file_size = 1024;
        c.max_files_per_request = 1;
    });
    // Skipped text field larger than the 10 MiB body allowance
    let filler = vec![b'x'; 11 * 1024 * 1024];

    let (status, body) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=h",
            &[Part {
                field: "note",
                filename: None,
                content_type: "text/plain",
                data: &filler,
            }],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["message"], "Request body exceeds the maximum allowed limit");
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_legacy_upload_is_flat() {
    let (tmp, app) = setup();

    let (status, body) = send(
        &app,
        upload_request(
            "/upload",
            &[file("file", "old client.gif", "image/gif", b"GIF89a")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap();
    let prefix = "http://localhost:4000/uploads/";
    assert!(url.starts_with(prefix));

    let filename = &url[prefix.len()..];
    assert!(filename.ends_with("-old_client.gif"));
    assert_eq!(std::fs::read(tmp.path().join(filename)).unwrap(), b"GIF89a");
    assert_eq!(staged_count(tmp.path()), 0);
}

#[tokio::test]
async fn test_stored_file_served_locally() {
    let (_tmp, app) = setup();

    let (_, body) = send(
        &app,
        upload_request(
            "/api/media/upload?type=logo&hash=h",
            &[file("file", "served.png", "image/png", b"pixels")],
        ),
    )
    .await;
    let url = body["url"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/{}", url))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"pixels");
}

#[tokio::test]
async fn test_health_and_request_id() {
    let (_tmp, app) = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-123");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "available");
}
