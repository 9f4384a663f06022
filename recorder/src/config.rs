//! Recorder configuration module.
//!
//! Parses configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `PORT` | No | 8787 | HTTP server port |
//! | `GRABBER_BIND_ADDR` | No | `127.0.0.1` | Address to bind |
//! | `GRABBER_DEFAULT_PROJECT_NAME` | No | `Untitled Project` | Name used when START omits one |
//! | `GRABBER_TITLE_SUFFIX_PATTERN` | No | `\s*\|[^|]*$` | Regex stripped from page titles |
//! | `GRABBER_MANIFEST_NAME` | No | `main.m3u8` | Master manifest file name |
//! | `GRABBER_QUEUE_CAPACITY` | No | 1024 | Engine event queue depth |

use std::env;
use std::net::IpAddr;

use thiserror::Error;

use crate::policy::{DEFAULT_MANIFEST_NAME, DEFAULT_TITLE_SUFFIX_PATTERN};

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 8787;

/// Default bind address. The recorder only talks to the local browser.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Project name used when START arrives without one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// Default engine queue depth.
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },

    /// Port number is invalid.
    #[error("invalid port number: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),

    /// Configuration validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Recorder configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,

    /// Address the HTTP server binds to.
    pub bind_addr: IpAddr,

    /// Project name for sessions started without one.
    pub default_project_name: String,

    /// Regular expression removed from page titles.
    pub title_suffix_pattern: String,

    /// File name identifying master manifests.
    pub manifest_name: String,

    /// Capacity of the engine's inbound queue.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            default_project_name: DEFAULT_PROJECT_NAME.to_string(),
            title_suffix_pattern: DEFAULT_TITLE_SUFFIX_PATTERN.to_string(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but malformed, or if the
    /// resulting configuration fails validation.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use grabber_recorder::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Recorder will listen on port {}", config.port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port()?;
        let bind_addr = parse_bind_addr()?;
        let default_project_name = env::var("GRABBER_DEFAULT_PROJECT_NAME")
            .unwrap_or_else(|_| DEFAULT_PROJECT_NAME.to_string());
        let title_suffix_pattern = env::var("GRABBER_TITLE_SUFFIX_PATTERN")
            .unwrap_or_else(|_| DEFAULT_TITLE_SUFFIX_PATTERN.to_string());
        let manifest_name = env::var("GRABBER_MANIFEST_NAME")
            .unwrap_or_else(|_| DEFAULT_MANIFEST_NAME.to_string());
        let queue_capacity = parse_queue_capacity()?;

        let config = Self {
            port,
            bind_addr,
            default_project_name,
            title_suffix_pattern,
            manifest_name,
            queue_capacity,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_project_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "GRABBER_DEFAULT_PROJECT_NAME cannot be blank".to_string(),
            ));
        }

        if self.manifest_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "GRABBER_MANIFEST_NAME cannot be blank".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse the PORT environment variable.
fn parse_port() -> Result<u16, ConfigError> {
    match env::var("PORT") {
        Ok(port_str) => Ok(port_str.parse()?),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_PORT),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: "PORT".to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}

fn parse_bind_addr() -> Result<IpAddr, ConfigError> {
    let raw = env::var("GRABBER_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    raw.trim().parse().map_err(|_| ConfigError::InvalidFormat {
        var: "GRABBER_BIND_ADDR".to_string(),
        message: format!("expected an IP address, got '{raw}'"),
    })
}

fn parse_queue_capacity() -> Result<usize, ConfigError> {
    let Ok(val) = env::var("GRABBER_QUEUE_CAPACITY") else {
        return Ok(DEFAULT_QUEUE_CAPACITY);
    };

    let capacity = val.parse::<usize>().map_err(|_| ConfigError::InvalidFormat {
        var: "GRABBER_QUEUE_CAPACITY".to_string(),
        message: format!("expected positive integer, got '{val}'"),
    })?;

    if capacity == 0 {
        return Err(ConfigError::InvalidFormat {
            var: "GRABBER_QUEUE_CAPACITY".to_string(),
            message: "queue capacity must be greater than 0".to_string(),
        });
    }

    Ok(capacity)
}
