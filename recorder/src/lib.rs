//! Course Grabber Recorder - background lesson capture.
//!
//! This crate records a course-browsing session as an ordered list of
//! lessons, each holding the master HLS manifest URLs seen while it was open:
//! - Tab title changes open new lessons
//! - Completed `main.m3u8` requests are attached to the current lesson
//! - A small control protocol starts, stops and inspects the session
//!
//! # Architecture
//!
//! All inputs funnel through one engine task (see [`engine`]) that owns the
//! [`store::SessionStore`]. The HTTP surface in [`routes`] only decodes
//! requests and forwards them to that task. Nothing is persisted; the
//! session lives in memory until it is exported.

pub mod badge;
pub mod config;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod policy;
pub mod protocol;
pub mod routes;
pub mod store;
pub mod stream;
pub mod types;

pub use engine::{EngineError, Recorder, RecorderHandle};
pub use error::{RecorderError, Result};
pub use types::{Lesson, ProjectExport, Session};
