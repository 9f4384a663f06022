//! HTTP client that moves a recorded export into the desktop backend.
//!
//! A push creates one project, then its lessons in order, then each lesson's
//! URLs in order:
//!
//! 1. `POST {api}/projects`
//! 2. `POST {api}/projects/{id}/lessons` per lesson (`order` starts at 1)
//! 3. `POST {api}/projects/{id}/lessons/{lesson_id}/urls` per URL
//!    (`part_number` starts at 1)
//!
//! Every request retries with exponential backoff (1s → 60s max, ±25%
//! jitter) on connection errors and `5xx` responses. A `4xx` response stops
//! the push immediately. Nothing already created is rolled back.
//!
//! The creates are not idempotent. A timed-out request may already have been
//! committed, so timeouts are not retried. A backend that commits and then
//! answers `5xx` will see a duplicate project, lesson or URL on the retry.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use grabber_handoff::client::{fetch_export, BackendClient, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let export = fetch_export("http://127.0.0.1:8787").await.unwrap();
//!     let client = BackendClient::new("http://localhost:8000/api", RetryPolicy::default()).unwrap();
//!     let summary = client.push(&export, Path::new("/home/me/Course Grabber")).await.unwrap();
//!     println!("{summary}");
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Response};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::HandoffError;
use crate::types::{Created, LessonCreate, ProjectCreate, ProjectExport, PushSummary, UrlAdd};

/// Initial retry delay in seconds.
const INITIAL_RETRY_DELAY_SECS: u64 = 1;

/// Maximum retry delay in seconds.
const MAX_RETRY_DELAY_SECS: u64 = 60;

/// Jitter factor (±25%).
const JITTER_FACTOR: f64 = 0.25;

/// Default attempts per request.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// HTTP request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backoff settings for backend requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(INITIAL_RETRY_DELAY_SECS),
            max_delay: Duration::from_secs(MAX_RETRY_DELAY_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            jitter: JITTER_FACTOR,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Millisecond delays so retry paths can be exercised quickly.
    #[must_use]
    pub fn fast_for_tests() -> Self {
        Self {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            max_attempts: 3,
            jitter: 0.0,
        }
    }

    /// Applies ±`jitter` to a duration.
    fn add_jitter(&self, duration: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return duration;
        }
        let jitter_range = duration.as_secs_f64() * self.jitter;
        let jitter = rand::rng().random_range(-jitter_range..=jitter_range);
        Duration::from_secs_f64((duration.as_secs_f64() + jitter).max(0.0))
    }

    /// Doubles `current` up to the maximum.
    fn next_delay(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_delay)
    }
}

/// Client for the desktop backend's project API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl BackendClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self, HandoffError> {
        Self::with_timeout(base_url, retry, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Like [`BackendClient::new`] with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, HandoffError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates the project, its lessons and their URLs.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::EmptyExport`] before any request if the export
    /// has no lessons. Otherwise returns the first request failure.
    pub async fn push(
        &self,
        export: &ProjectExport,
        save_location: &Path,
    ) -> Result<PushSummary, HandoffError> {
        if export.lessons.is_empty() {
            return Err(HandoffError::EmptyExport {
                name: export.name.clone(),
            });
        }

        let project = self
            .create(
                "projects",
                &ProjectCreate {
                    name: export.name.clone(),
                    description: None,
                    save_location: save_location.display().to_string(),
                },
            )
            .await?;
        info!(project_id = %project.id, name = %export.name, "Project created");

        let mut urls = 0;
        for (order, lesson) in (1u32..).zip(&export.lessons) {
            let created = self
                .create(
                    &format!("projects/{}/lessons", project.id),
                    &LessonCreate {
                        title: lesson.title.clone(),
                        order,
                    },
                )
                .await?;
            debug!(lesson_id = %created.id, order, title = %lesson.title, "Lesson created");

            for (part_number, url) in (1u32..).zip(&lesson.urls) {
                self.create(
                    &format!("projects/{}/lessons/{}/urls", project.id, created.id),
                    &UrlAdd {
                        url: url.clone(),
                        part_number,
                    },
                )
                .await?;
                urls += 1;
            }
        }

        let summary = PushSummary {
            project_id: project.id,
            lessons: export.lessons.len(),
            urls,
        };
        info!(
            project_id = %summary.project_id,
            lessons = summary.lessons,
            urls = summary.urls,
            "Export pushed"
        );
        Ok(summary)
    }

    /// POSTs `body` to `{base}/{path}` with retries.
    async fn create<B: Serialize>(&self, path: &str, body: &B) -> Result<Created, HandoffError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut delay = self.retry.initial_delay;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(url = %url, attempt = attempts, "Sending request");

            match self.client.post(&url).json(body).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json::<Created>().await?);
                    }

                    let message = error_body(response).await;

                    if status.is_client_error() {
                        warn!(status = status.as_u16(), message = %message, "Request rejected");
                        return Err(HandoffError::Rejected {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    warn!(
                        status = status.as_u16(),
                        message = %message,
                        attempt = attempts,
                        "Server error, will retry"
                    );
                    if attempts >= self.retry.max_attempts {
                        return Err(HandoffError::ServerError {
                            status: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(e) if e.is_timeout() => {
                    warn!(error = %e, url = %url, "Request timed out, not retrying");
                    return Err(HandoffError::Http(e));
                }
                Err(e) if e.is_connect() => {
                    warn!(error = %e, attempt = attempts, "Connection error, will retry");
                    if attempts >= self.retry.max_attempts {
                        return Err(HandoffError::MaxRetriesExceeded { attempts });
                    }
                }
                Err(e) => return Err(HandoffError::Http(e)),
            }

            let wait = self.retry.add_jitter(delay);
            debug!(delay_ms = wait.as_millis(), "Waiting before retry");
            sleep(wait).await;
            delay = self.retry.next_delay(delay);
        }
    }
}

async fn error_body(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Fetches the current export from a running recorder.
///
/// # Errors
///
/// Returns [`HandoffError`] if the recorder is unreachable, answers with an
/// error status, or returns something other than an export.
pub async fn fetch_export(recorder_url: &str) -> Result<ProjectExport, HandoffError> {
    let url = format!("{}/export", recorder_url.trim_end_matches('/'));
    let client = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;

    debug!(url = %url, "Fetching export from recorder");
    let response = client.get(&url).send().await?;
    let status = response.status();

    if !status.is_success() {
        let message = error_body(response).await;
        return Err(if status.is_client_error() {
            HandoffError::Rejected {
                status: status.as_u16(),
                message,
            }
        } else {
            HandoffError::ServerError {
                status: status.as_u16(),
                message,
            }
        });
    }

    Ok(response.json().await?)
}

/// Reads an export previously saved with `grabber-handoff show`.
///
/// # Errors
///
/// Returns [`HandoffError`] if the file cannot be read or parsed.
pub fn read_export(path: &Path) -> Result<ProjectExport, HandoffError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        let base = Duration::from_secs(10);

        for _ in 0..100 {
            let secs = policy.add_jitter(base).as_secs_f64();
            assert!((7.5..=12.5).contains(&secs), "Jitter out of bounds: {secs}");
        }
    }

    #[test]
    fn next_delay_doubles_until_cap() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_delay;
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(delay.as_secs());
            delay = policy.next_delay(delay);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn zero_jitter_is_exact() {
        let policy = RetryPolicy::fast_for_tests();
        assert_eq!(
            policy.add_jitter(Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn max_attempts_never_below_one() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://localhost:8000/api/", RetryPolicy::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
    }
}
