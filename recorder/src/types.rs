//! Shared data types for the recorder.
//!
//! Wire shapes use `camelCase` field names because the popup UI and the
//! browser glue speak the extension's message format. The export artifact
//! ([`ProjectExport`]) is the contract with the desktop backend and its field
//! names must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A titled group of captured stream URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    /// Captured URLs in capture order. Never contains duplicates.
    pub urls: Vec<String>,
}

impl Lesson {
    /// Creates an empty lesson with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            urls: Vec::new(),
        }
    }

    /// Appends `url` unless it is already present.
    ///
    /// Returns `true` if the URL was inserted.
    pub fn add_url(&mut self, url: &str) -> bool {
        if self.urls.iter().any(|existing| existing == url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }
}

/// The recording session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub active: bool,
    pub project_name: String,
    pub lessons: Vec<Lesson>,

    /// Index of the selected lesson. Serialized as `-1` when nothing is
    /// selected.
    #[serde(with = "lesson_index")]
    pub current_lesson_index: Option<usize>,

    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Session {
    /// The inactive session that exists before any START.
    #[must_use]
    pub fn idle(project_name: impl Into<String>) -> Self {
        Self {
            active: false,
            project_name: project_name.into(),
            lessons: Vec::new(),
            current_lesson_index: None,
            started_at: None,
            stopped_at: None,
        }
    }

    /// Returns the currently selected lesson, if any.
    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.current_lesson_index.and_then(|i| self.lessons.get(i))
    }

    /// Builds the hand-off artifact for the desktop backend.
    #[must_use]
    pub fn export(&self) -> ProjectExport {
        ProjectExport {
            name: self.project_name.clone(),
            lessons: self
                .lessons
                .iter()
                .map(|lesson| ExportedLesson {
                    title: lesson.title.clone(),
                    urls: lesson.urls.clone(),
                })
                .collect(),
        }
    }
}

/// Canonical export artifact consumed by the desktop project API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectExport {
    pub name: String,
    pub lessons: Vec<ExportedLesson>,
}

/// One lesson inside a [`ProjectExport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedLesson {
    pub title: String,
    pub urls: Vec<String>,
}

/// A tab reported a new title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabTitleChanged {
    pub tab_id: i64,
    pub new_title: String,
    pub is_active_tab: bool,
}

/// A network request completed somewhere in the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCompleted {
    pub url: String,
}

/// Serde adapter mapping `Option<usize>` onto the `-1`-sentinel integer.
mod lesson_index {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(index) => serializer.serialize_i64(*index as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        match raw {
            -1 => Ok(None),
            n if n >= 0 => Ok(Some(n as usize)),
            n => Err(serde::de::Error::custom(format!(
                "lesson index must be -1 or non-negative, got {n}"
            ))),
        }
    }
}
