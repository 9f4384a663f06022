//! Course Grabber Handoff - moves a recorded course into the desktop backend.
//!
//! The recorder produces a [`types::ProjectExport`]; this crate turns it into
//! a project, lessons and URLs through the backend's REST API, retrying
//! transient failures with backoff.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{fetch_export, read_export, BackendClient, RetryPolicy};
pub use error::HandoffError;
pub use types::{ProjectExport, PushSummary};
