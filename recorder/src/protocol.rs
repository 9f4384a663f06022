//! Control message protocol spoken by the popup UI.
//!
//! Messages are JSON objects discriminated by a `type` field:
//!
//! | Message | Response |
//! |---------|----------|
//! | `{"type":"START_SESSION","projectName":"Algebra"}` | `{"success":true,"session":{...}}` |
//! | `{"type":"STOP_SESSION"}` | `{"success":true,"session":{...}}` |
//! | `{"type":"GET_SESSION"}` | `{"session":{...}}` |
//! | `{"type":"VIDEOS_FOUND","count":3,"tabId":12}` | none |
//!
//! Anything else gets no response at all. [`ControlMessage::parse`] returns
//! `None` for those messages instead of an error so callers cannot
//! accidentally answer them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::types::Session;

/// A request from the popup UI or the content detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    StartSession {
        #[serde(
            default,
            rename = "projectName",
            skip_serializing_if = "Option::is_none"
        )]
        project_name: Option<String>,
    },
    StopSession,
    GetSession,
    /// Badge-only notification from the content detector.
    VideosFound {
        count: u32,
        #[serde(default, rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<i64>,
    },
}

impl ControlMessage {
    /// Interprets an arbitrary JSON value as a control message.
    ///
    /// Returns `None` for unknown `type` values and malformed payloads.
    #[must_use]
    pub fn parse(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(message) => Some(message),
            Err(err) => {
                debug!(error = %err, "Dropping unrecognized control message");
                None
            }
        }
    }

    /// Wire name of the message type, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartSession { .. } => "START_SESSION",
            Self::StopSession => "STOP_SESSION",
            Self::GetSession => "GET_SESSION",
            Self::VideosFound { .. } => "VIDEOS_FOUND",
        }
    }
}

/// Reply to a control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    /// Reply to START and STOP.
    Ack { success: bool, session: Session },
    /// Reply to GET.
    Snapshot { session: Session },
}

impl ControlResponse {
    #[must_use]
    pub fn ack(session: Session) -> Self {
        Self::Ack {
            success: true,
            session,
        }
    }

    #[must_use]
    pub fn snapshot(session: Session) -> Self {
        Self::Snapshot { session }
    }

    /// The session carried by either variant.
    #[must_use]
    pub fn session(&self) -> &Session {
        match self {
            Self::Ack { session, .. } | Self::Snapshot { session } => session,
        }
    }
}
