//! Configuration module for the handoff client.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `GRABBER_RECORDER_URL` | No | `http://127.0.0.1:8787` | Recorder base URL |
//! | `GRABBER_BACKEND_URL` | No | `http://localhost:8000/api` | Desktop backend API base |
//! | `GRABBER_SAVE_LOCATION` | No | `~/Course Grabber` | Where the backend stores the project |
//! | `GRABBER_MAX_RETRIES` | No | 5 | Attempts per request (1-10) |

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

const DEFAULT_RECORDER_URL: &str = "http://127.0.0.1:8787";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";

/// Default save directory name relative to home.
const DEFAULT_SAVE_DIR: &str = "Course Grabber";

const DEFAULT_MAX_RETRIES: u32 = 5;

const MIN_RETRIES: u32 = 1;

const MAX_RETRIES: u32 = 10;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the handoff client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Recorder base URL, without trailing slash.
    pub recorder_url: String,

    /// Backend API base URL, without trailing slash.
    pub backend_url: String,

    /// Directory the backend saves the project under.
    pub save_location: PathBuf,

    /// Attempts per backend request, including the first.
    pub max_retries: u32,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - A URL variable is set but is not an `http(s)` URL
    /// - `GRABBER_MAX_RETRIES` is not an integer between 1 and 10
    /// - `GRABBER_SAVE_LOCATION` is unset and the home directory is unknown
    pub fn from_env() -> Result<Self, ConfigError> {
        let recorder_url = parse_url("GRABBER_RECORDER_URL", DEFAULT_RECORDER_URL)?;
        let backend_url = parse_url("GRABBER_BACKEND_URL", DEFAULT_BACKEND_URL)?;

        let save_location = match env::var("GRABBER_SAVE_LOCATION") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_save_location()?,
        };

        let max_retries = match env::var("GRABBER_MAX_RETRIES") {
            Ok(val) => {
                let retries = val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                    key: "GRABBER_MAX_RETRIES".to_string(),
                    message: format!("expected positive integer, got '{val}'"),
                })?;
                if !(MIN_RETRIES..=MAX_RETRIES).contains(&retries) {
                    return Err(ConfigError::InvalidValue {
                        key: "GRABBER_MAX_RETRIES".to_string(),
                        message: format!(
                            "must be between {MIN_RETRIES} and {MAX_RETRIES}, got {retries}"
                        ),
                    });
                }
                retries
            }
            Err(_) => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            recorder_url,
            backend_url,
            save_location,
            max_retries,
        })
    }
}

/// `~/Course Grabber`.
pub fn default_save_location() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(base_dirs.home_dir().join(DEFAULT_SAVE_DIR))
}

fn parse_url(key: &str, default: &str) -> Result<String, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default.to_string());
    };

    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an http(s) URL, got '{raw}'"),
        });
    }

    Ok(url.to_string())
}
