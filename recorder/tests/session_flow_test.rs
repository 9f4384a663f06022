//! End-to-end recording flows through the HTTP surface.
//!
//! Each test drives a freshly spawned engine through the router the same way
//! the browser glue would: control messages, title changes and completed
//! requests, in order, then inspects the export.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;

use grabber_recorder::config::Config;
use grabber_recorder::engine::Recorder;
use grabber_recorder::routes::{create_router, AppState};

fn app() -> Router {
    let (handle, _engine) = Recorder::default().spawn(64);
    create_router(AppState::new(Config::default(), handle))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Option<Value>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = assert_ok!(app.clone().oneshot(request).await);
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    (status, json)
}

async fn control(app: &Router, message: Value) -> (StatusCode, Option<Value>) {
    post(app, "/messages", message).await
}

async fn title(app: &Router, text: &str) {
    let (status, _) = post(
        app,
        "/events/tab-title",
        json!({"tabId": 1, "newTitle": text, "isActiveTab": true}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

async fn request(app: &Router, url: &str) {
    let (status, _) = post(app, "/events/request-completed", json!({ "url": url })).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

async fn export_json(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/export").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn session(app: &Router) -> Value {
    let (status, body) = control(app, json!({"type": "GET_SESSION"})).await;
    assert_eq!(status, StatusCode::OK);
    body.unwrap()["session"].clone()
}

#[tokio::test]
async fn algebra_course_exports_two_lessons() {
    let app = app();

    let (status, body) = control(&app, json!({"type": "START_SESSION", "projectName": "Algebra"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["success"], true);

    title(&app, "Lesson 1 | Site").await;
    request(&app, ".../main.m3u8").await;
    title(&app, "Lesson 2 | Site").await;
    request(&app, ".../720/main.m3u8?x=1").await;

    let (status, body) = control(&app, json!({"type": "STOP_SESSION"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["session"]["active"], false);

    assert_eq!(
        export_json(&app).await,
        r#"{"name":"Algebra","lessons":[{"title":"Lesson 1","urls":[".../main.m3u8"]},{"title":"Lesson 2","urls":[".../720/main.m3u8?x=1"]}]}"#
    );
}

#[tokio::test]
async fn start_yields_empty_session() {
    let app = app();
    let (_, body) = control(&app, json!({"type": "START_SESSION", "projectName": "Geometry"})).await;
    let session = &body.unwrap()["session"];

    assert_eq!(session["active"], true);
    assert_eq!(session["lessons"], json!([]));
    assert_eq!(session["currentLessonIndex"], -1);
    assert!(session["startedAt"].is_string());
}

#[tokio::test]
async fn repeated_titles_collapse_only_when_adjacent() {
    let app = app();
    control(&app, json!({"type": "START_SESSION"})).await;

    for text in ["T1", "T1", "T2", "T2", "T2", "T3", "T1"] {
        title(&app, text).await;
    }

    let session = session(&app).await;
    let titles: Vec<&str> = session["lessons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|lesson| lesson["title"].as_str().unwrap())
        .collect();

    assert_eq!(titles, vec!["T1", "T2", "T3", "T1"]);
    assert_eq!(session["currentLessonIndex"], 3);
    assert_eq!(session["projectName"], "Untitled Project");
}

#[tokio::test]
async fn stream_before_navigation_opens_introduction() {
    let app = app();
    control(&app, json!({"type": "START_SESSION", "projectName": "Algebra"})).await;

    request(&app, "https://cdn.example/course/main.m3u8").await;
    request(&app, "https://cdn.example/course/main.m3u8").await;
    request(&app, "https://cdn.example/course/audio.m3u8").await;

    assert_eq!(
        export_json(&app).await,
        r#"{"name":"Algebra","lessons":[{"title":"Introduction","urls":["https://cdn.example/course/main.m3u8"]}]}"#
    );
}

#[tokio::test]
async fn background_tabs_and_url_titles_are_ignored() {
    let app = app();
    control(&app, json!({"type": "START_SESSION"})).await;

    let (status, _) = post(
        &app,
        "/events/tab-title",
        json!({"tabId": 2, "newTitle": "Other tab", "isActiveTab": false}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    title(&app, "https://site.example/watch?v=1").await;
    title(&app, " | Site").await;

    let session = session(&app).await;
    assert_eq!(session["lessons"], json!([]));
    assert_eq!(session["currentLessonIndex"], -1);
}

#[tokio::test]
async fn stop_twice_returns_identical_snapshots() {
    let app = app();
    control(&app, json!({"type": "START_SESSION", "projectName": "Algebra"})).await;
    title(&app, "Lesson 1").await;

    let (_, first) = control(&app, json!({"type": "STOP_SESSION"})).await;
    let (_, second) = control(&app, json!({"type": "STOP_SESSION"})).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn stop_before_start_is_a_no_op() {
    let app = app();
    let before = session(&app).await;

    let (status, body) = control(&app, json!({"type": "STOP_SESSION"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["session"], before);
}

#[tokio::test]
async fn unknown_control_type_has_empty_no_content_reply() {
    let app = app();
    control(&app, json!({"type": "START_SESSION", "projectName": "Algebra"})).await;
    let before = session(&app).await;

    let (status, body) = control(&app, json!({"type": "PAUSE_SESSION"})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());

    assert_eq!(session(&app).await, before);
}

#[tokio::test]
async fn restart_discards_previous_recording() {
    let app = app();
    control(&app, json!({"type": "START_SESSION", "projectName": "First"})).await;
    title(&app, "Lesson 1").await;
    request(&app, "https://cdn/a/main.m3u8").await;

    control(&app, json!({"type": "START_SESSION", "projectName": "Second"})).await;

    assert_eq!(export_json(&app).await, r#"{"name":"Second","lessons":[]}"#);
}
