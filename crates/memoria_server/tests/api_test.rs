//! End-to-end tests driving the router in-process.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use memoria_guestbook::GuestbookLog;
use memoria_restyle::{LocalFilter, RestyleCache, RestylePipeline, RestyleStrategy};
use memoria_server::{AppState, CarouselSessions, router};
use memoria_storage::{FileSystemStorage, MediaStorage, ProfileStore};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

async fn test_state(dir: &TempDir) -> AppState {
    let storage: Arc<dyn MediaStorage> =
        Arc::new(FileSystemStorage::open(dir.path(), IO_TIMEOUT).await.unwrap());
    let guestbook = Arc::new(
        GuestbookLog::open(dir.path().join("guestbook.jsonl"), IO_TIMEOUT)
            .await
            .unwrap(),
    );
    let local: Arc<dyn RestyleStrategy> = Arc::new(LocalFilter::default());
    let cache = RestyleCache::load(dir.path(), IO_TIMEOUT).await.unwrap();
    let pipeline = Arc::new(RestylePipeline::new(storage.clone(), vec![local], cache));
    let profile = Arc::new(ProfileStore::new(dir.path(), IO_TIMEOUT));
    AppState::new(storage, guestbook, pipeline, profile)
}

async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, Body::from(body.to_string())).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(16, 16, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_health() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, body) = send_json(&app, Method::GET, "/health", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_duplicate_upload_stored_once() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, first) = send(&app, Method::PUT, "/media?name=dog.jpg", Body::from("woof")).await;
    assert_eq!(status, StatusCode::CREATED);
    let first: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(first["duplicate"], json!(false));

    let (status, second) = send(&app, Method::PUT, "/media?name=dog.jpg", Body::from("woof")).await;
    assert_eq!(status, StatusCode::OK);
    let second: Value = serde_json::from_slice(&second).unwrap();
    assert_eq!(second["duplicate"], json!(true));
    assert_eq!(first["key"], second["key"]);

    let (_, keys) = send_json(&app, Method::GET, "/media", Value::Null).await;
    assert_eq!(keys.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_and_delete_media() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (_, put) = send(&app, Method::PUT, "/media?name=cat.png", Body::from(png())).await;
    let key = serde_json::from_slice::<Value>(&put).unwrap()["key"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, bytes) = send(&app, Method::GET, &format!("/media/{key}"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, png());

    let (status, _) = send(&app, Method::DELETE, &format!("/media/{key}"), Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Idempotent
    let (status, _) = send(&app, Method::DELETE, &format!("/media/{key}"), Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/media/{key}"), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, _) = send(&app, Method::PUT, "/media?name=empty.jpg", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_view_is_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, _) = send_json(&app, Method::GET, "/media?view=sideways", Value::Null).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_restyle_and_views() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (_, put) = send(&app, Method::PUT, "/media?name=dog.png", Body::from(png())).await;
    let key = serde_json::from_slice::<Value>(&put).unwrap()["key"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, result) =
        send_json(&app, Method::POST, &format!("/media/{key}/restyle"), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["outcome"], json!("success"));
    assert_eq!(result["strategyUsed"], json!("local"));
    let output = result["outputKey"].as_str().unwrap().to_string();

    let (_, restyled) = send_json(&app, Method::GET, "/media?view=restyled", Value::Null).await;
    assert_eq!(restyled, json!([output]));
    let (_, all) = send_json(&app, Method::GET, "/media?view=all", Value::Null).await;
    assert_eq!(all, json!([key, output]));

    // Deleting the Original takes the derivative with it
    send(&app, Method::DELETE, &format!("/media/{key}"), Body::empty()).await;
    let (_, all) = send_json(&app, Method::GET, "/media?view=all", Value::Null).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_restyle_unknown_key_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/media/0123456789abcdef_missing.jpg/restyle",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_restyle_all_reports_items() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    send(&app, Method::PUT, "/media?name=good.png", Body::from(png())).await;
    send(&app, Method::PUT, "/media?name=bad.jpg", Body::from("not an image")).await;

    let (status, report) =
        send_json(&app, Method::POST, "/media/restyle-all", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(report["failed"].as_array().unwrap().len(), 1);
    assert_eq!(report["cancelled"], json!(false));
}

#[tokio::test]
async fn test_guestbook_flow() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/guestbook",
        json!({"authorName": "Alice", "messageBody": "Miss you"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    send_json(
        &app,
        Method::POST,
        "/guestbook",
        json!({"authorName": "Bob", "messageBody": "Goodbye friend"}),
    )
    .await;

    let (_, entries) = send_json(&app, Method::GET, "/guestbook", Value::Null).await;
    let authors: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["authorName"].as_str().unwrap())
        .collect();
    assert_eq!(authors, vec!["Bob", "Alice"]);

    let (status, _) = send_json(&app, Method::DELETE, "/guestbook/1", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_json(&app, Method::DELETE, "/guestbook/9", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, entries) = send_json(&app, Method::GET, "/guestbook", Value::Null).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["authorName"], json!("Bob"));
}

#[tokio::test]
async fn test_blank_guestbook_entry_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/guestbook",
        json!({"authorName": "  ", "messageBody": "hello"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_memorial_profile() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let (status, _) = send_json(&app, Method::GET, "/memorial", Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let profile = json!({"name": "Biscuit", "birthDate": "2010-04-01", "passDate": "2024-02-10"});
    let (status, _) = send_json(&app, Method::PUT, "/memorial", profile.clone()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_json(&app, Method::GET, "/memorial", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, profile);

    let reversed = json!({"name": "Biscuit", "birthDate": "2024-02-10", "passDate": "2010-04-01"});
    let (status, _) = send_json(&app, Method::PUT, "/memorial", reversed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_carousel_sessions_are_independent() {
    let temp_dir = TempDir::new().unwrap();
    let app = router(test_state(&temp_dir).await);

    let mut keys = Vec::new();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        let (_, put) = send(
            &app,
            Method::PUT,
            &format!("/media?name={name}"),
            Body::from(name.to_string()),
        )
        .await;
        keys.push(serde_json::from_slice::<Value>(&put).unwrap()["key"].clone());
    }

    let (_, at) = send_json(&app, Method::POST, "/carousel/one?step=stay", Value::Null).await;
    assert_eq!(at["index"], json!(0));
    assert_eq!(at["key"], keys[0]);

    for expected in [1, 2, 0] {
        let (_, at) = send_json(&app, Method::POST, "/carousel/one?step=next", Value::Null).await;
        assert_eq!(at["index"], json!(expected));
    }

    let (_, other) = send_json(&app, Method::POST, "/carousel/two?step=prev", Value::Null).await;
    assert_eq!(other["index"], json!(2));
    assert_eq!(other["key"], keys[2]);

    // Deleting the item session two is viewing keeps it in bounds
    let key = keys[2].as_str().unwrap();
    send(&app, Method::DELETE, &format!("/media/{key}"), Body::empty()).await;
    let (_, other) = send_json(&app, Method::POST, "/carousel/two", Value::Null).await;
    assert_eq!(other["index"], json!(1));
    assert_eq!(other["len"], json!(2));

    let (_, empty) =
        send_json(&app, Method::POST, "/carousel/two?view=restyled", Value::Null).await;
    assert_eq!(empty["index"], Value::Null);
    assert_eq!(empty["key"], Value::Null);
}

#[tokio::test]
async fn test_carousel_session_table_is_bounded() {
    let temp_dir = TempDir::new().unwrap();
    let mut state = test_state(&temp_dir).await;
    state.sessions = CarouselSessions::new(4, Duration::from_secs(60));
    let sessions = state.sessions.clone();
    let app = router(state);

    for i in 0..50 {
        let (status, _) =
            send_json(&app, Method::POST, &format!("/carousel/s{i}?step=next"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(sessions.len() <= 4);
}
