//! In-memory owner of the recording session.
//!
//! [`SessionStore`] is a plain owned value with no interior mutability. The
//! engine task holds the only instance and applies every event to it in
//! arrival order, so none of the operations here need synchronization.
//!
//! # Example
//!
//! ```rust
//! use grabber_recorder::store::SessionStore;
//!
//! let mut store = SessionStore::new("Untitled Project");
//! assert!(!store.session().active);
//!
//! let session = store.start(Some("Algebra".to_string()));
//! assert!(session.active);
//! assert_eq!(session.project_name, "Algebra");
//! assert_eq!(session.current_lesson_index, None);
//! ```

use chrono::Utc;
use tracing::{debug, info};

use crate::types::{Lesson, ProjectExport, Session};

/// Owns the single [`Session`] record.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Session,
    default_project_name: String,
}

impl SessionStore {
    /// Creates a store holding an inactive session.
    ///
    /// `default_project_name` is used whenever START arrives without a name.
    #[must_use]
    pub fn new(default_project_name: impl Into<String>) -> Self {
        let default_project_name = default_project_name.into();
        Self {
            session: Session::idle(default_project_name.clone()),
            default_project_name,
        }
    }

    /// Discards the previous session and starts a fresh one.
    ///
    /// A missing or blank `project_name` falls back to the default.
    pub fn start(&mut self, project_name: Option<String>) -> Session {
        let project_name = project_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.default_project_name.clone());

        let discarded_lessons = self.session.lessons.len();

        self.session = Session {
            active: true,
            project_name,
            lessons: Vec::new(),
            current_lesson_index: None,
            started_at: Some(Utc::now()),
            stopped_at: None,
        };

        info!(
            project = %self.session.project_name,
            discarded_lessons,
            "Recording session started"
        );

        self.session.clone()
    }

    /// Marks the session inactive, keeping its lessons.
    ///
    /// Stopping an inactive session changes nothing.
    pub fn stop(&mut self) -> Session {
        if self.session.active {
            self.session.active = false;
            self.session.stopped_at = Some(Utc::now());
            info!(
                project = %self.session.project_name,
                lessons = self.session.lessons.len(),
                "Recording session stopped"
            );
        } else {
            debug!("Stop requested on inactive session");
        }

        self.session.clone()
    }

    /// Returns a snapshot of the session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.session.clone()
    }

    /// Borrows the session without cloning.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.active
    }

    /// Title of the selected lesson, if any.
    #[must_use]
    pub fn current_lesson_title(&self) -> Option<&str> {
        self.session.current_lesson().map(|lesson| lesson.title.as_str())
    }

    /// Appends a new lesson and selects it. Returns its index.
    pub fn open_lesson(&mut self, title: impl Into<String>) -> usize {
        self.session.lessons.push(Lesson::new(title));
        let index = self.session.lessons.len() - 1;
        self.session.current_lesson_index = Some(index);
        index
    }

    /// Adds `url` to the selected lesson.
    ///
    /// Returns `None` when no lesson is selected, otherwise whether the URL
    /// was new to that lesson.
    pub fn record_url(&mut self, url: &str) -> Option<bool> {
        let index = self.session.current_lesson_index?;
        self.session
            .lessons
            .get_mut(index)
            .map(|lesson| lesson.add_url(url))
    }

    /// Builds the export artifact from the current session.
    #[must_use]
    pub fn export(&self) -> ProjectExport {
        self.session.export()
    }
}
