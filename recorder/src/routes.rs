//! HTTP route handlers for the recorder.
//!
//! The browser-side glue forwards everything it observes to these endpoints:
//!
//! - `POST /messages` - Control protocol (START/STOP/GET/VIDEOS_FOUND)
//! - `POST /events/tab-title` - Tab title change notifications
//! - `POST /events/request-completed` - Completed network requests
//! - `GET /export` - Export artifact for the current session
//! - `GET /badges/{tab_id}` - Badge to show for a tab
//! - `GET /health` - Health check endpoint
//!
//! # Architecture
//!
//! Handlers never touch the session directly. They decode the body and hand
//! the result to the engine through the [`RecorderHandle`] in [`AppState`],
//! so requests from every producer are applied in the order they reach the
//! engine queue.
//!
//! # Example
//!
//! ```rust,no_run
//! use grabber_recorder::config::Config;
//! use grabber_recorder::engine::Recorder;
//! use grabber_recorder::routes::{create_router, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let (recorder, _engine) = Recorder::from_config(&config)
//!         .expect("invalid policy")
//!         .spawn(config.queue_capacity);
//!     let app = create_router(AppState::new(config, recorder));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8787").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::{EngineError, RecorderHandle};
use crate::protocol::ControlMessage;
use crate::types::{RequestCompleted, TabTitleChanged};

// ============================================================================
// Constants
// ============================================================================

/// Maximum accepted request body (64 KiB).
const MAX_BODY_SIZE: usize = 64 * 1024;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Recorder configuration.
    pub config: Arc<Config>,

    /// Sender side of the engine queue.
    pub recorder: RecorderHandle,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state around a running engine.
    #[must_use]
    pub fn new(config: Config, recorder: RecorderHandle) -> Self {
        Self {
            config: Arc::new(config),
            recorder,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("recorder", &self.recorder)
            .field("start_time", &self.start_time)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
///
/// CORS is permissive so the browser extension can call in from its own origin.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/messages", post(post_message))
        .route("/events/tab-title", post(post_tab_title))
        .route("/events/request-completed", post(post_request_completed))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .route("/export", get(get_export))
        .route("/badges/{tab_id}", get(get_badge))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Error Response Types
// ============================================================================

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

fn engine_unavailable(err: EngineError) -> Response {
    warn!(error = %err, "Recorder engine unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new(err.to_string()).with_code("engine_unavailable")),
    )
        .into_response()
}

/// Decodes a producer event, mapping failures to `400`.
fn decode_event<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "Rejecting malformed event body");
        (
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new(format!("invalid event format: {err}"))
                    .with_code("invalid_event"),
            ),
        )
            .into_response()
    })
}

// ============================================================================
// POST /messages - Control Protocol
// ============================================================================

/// POST /messages - Control protocol endpoint.
///
/// # Responses
///
/// - `200 OK` - START, STOP and GET, with their JSON reply
/// - `204 No Content` - VIDEOS_FOUND, and any unknown or malformed message
/// - `503 Service Unavailable` - Engine is not running
async fn post_message(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(value) = serde_json::from_slice::<Value>(&body) else {
        debug!(bytes = body.len(), "Dropping control message that is not JSON");
        return StatusCode::NO_CONTENT.into_response();
    };

    let Some(message) = ControlMessage::parse(value) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match state.recorder.control(message).await {
        Ok(Some(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => engine_unavailable(err),
    }
}

// ============================================================================
// POST /events/* - Producer Events
// ============================================================================

async fn post_tab_title(State(state): State<AppState>, body: Bytes) -> Response {
    let event: TabTitleChanged = match decode_event(&body) {
        Ok(event) => event,
        Err(response) => return response,
    };

    match state.recorder.tab_title_changed(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => engine_unavailable(err),
    }
}

async fn post_request_completed(State(state): State<AppState>, body: Bytes) -> Response {
    let event: RequestCompleted = match decode_event(&body) {
        Ok(event) => event,
        Err(response) => return response,
    };

    match state.recorder.request_completed(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => engine_unavailable(err),
    }
}

// ============================================================================
// GET /export, GET /badges/{tab_id}
// ============================================================================

async fn get_export(State(state): State<AppState>) -> Response {
    match state.recorder.export().await {
        Ok(export) => Json(export).into_response(),
        Err(err) => engine_unavailable(err),
    }
}

/// GET /badges/{tab_id}
///
/// `global` addresses the badge for reports that carried no tab id.
async fn get_badge(State(state): State<AppState>, Path(tab_id): Path<String>) -> Response {
    let tab_id = if tab_id == "global" {
        None
    } else {
        match tab_id.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(
                        ErrorResponse::new(format!("invalid tab id: {tab_id}"))
                            .with_code("invalid_tab_id"),
                    ),
                )
                    .into_response();
            }
        }
    };

    match state.recorder.badge(tab_id).await {
        Ok(badge) => Json(badge).into_response(),
        Err(err) => engine_unavailable(err),
    }
}

// ============================================================================
// GET /health - Health Check
// ============================================================================

/// Health check response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` while the engine answers.
    pub status: String,
    /// Whether a recording session is in progress.
    pub session_active: bool,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health
///
/// ```json
/// { "status": "ok", "session_active": false, "uptime_seconds": 3600 }
/// ```
async fn get_health(State(state): State<AppState>) -> Response {
    let uptime = state.start_time.elapsed();

    match state.recorder.control(ControlMessage::GetSession).await {
        Ok(response) => Json(HealthResponse {
            status: "ok".to_string(),
            session_active: response.is_some_and(|r| r.session().active),
            uptime_seconds: uptime.as_secs(),
        })
        .into_response(),
        Err(err) => engine_unavailable(err),
    }
}

// ============================================================================
// Tests
// ============================================================================
