//! Wire types shared with the recorder and the desktop backend.
//!
//! [`ProjectExport`] is the artifact produced by the recorder's `GET /export`.
//! The remaining types mirror the backend's project API request and response
//! bodies, which use `snake_case` field names.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recorded course, as exported by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectExport {
    pub name: String,
    pub lessons: Vec<ExportedLesson>,
}

impl ProjectExport {
    /// Total number of stream URLs across all lessons.
    #[must_use]
    pub fn url_count(&self) -> usize {
        self.lessons.iter().map(|lesson| lesson.urls.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedLesson {
    pub title: String,
    pub urls: Vec<String>,
}

/// Body of `POST /projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub save_location: String,
}

/// Body of `POST /projects/{id}/lessons`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCreate {
    pub title: String,
    /// 1-based position within the project.
    pub order: u32,
}

/// Body of `POST /projects/{id}/lessons/{lesson_id}/urls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlAdd {
    pub url: String,
    /// 1-based position within the lesson.
    pub part_number: u32,
}

/// Any backend resource response; only the id is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Result of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    pub project_id: Uuid,
    pub lessons: usize,
    pub urls: usize,
}

impl fmt::Display for PushSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "project {} created with {} lesson(s) and {} URL(s)",
            self.project_id, self.lessons, self.urls
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn export_parses_recorder_artifact() {
        let export: ProjectExport = serde_json::from_value(json!({
            "name": "Algebra",
            "lessons": [
                {"title": "Lesson 1", "urls": ["a/main.m3u8"]},
                {"title": "Lesson 2", "urls": ["b/main.m3u8", "c/main.m3u8"]}
            ]
        }))
        .unwrap();

        assert_eq!(export.lessons.len(), 2);
        assert_eq!(export.url_count(), 3);
    }

    #[test]
    fn project_create_omits_missing_description() {
        let body = ProjectCreate {
            name: "Algebra".to_string(),
            description: None,
            save_location: "/tmp/courses".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"name": "Algebra", "save_location": "/tmp/courses"})
        );
    }

    #[test]
    fn created_ignores_extra_fields() {
        let created: Created = serde_json::from_value(json!({
            "id": "7f1c7a3e-2d7a-4d8e-9d77-0b5c8f7e1a11",
            "name": "Algebra",
            "lessons": []
        }))
        .unwrap();
        assert_eq!(
            created.id.to_string(),
            "7f1c7a3e-2d7a-4d8e-9d77-0b5c8f7e1a11"
        );
    }

    #[test]
    fn url_add_uses_snake_case() {
        let body = UrlAdd {
            url: "x/main.m3u8".to_string(),
            part_number: 2,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"url": "x/main.m3u8", "part_number": 2})
        );
    }
}
