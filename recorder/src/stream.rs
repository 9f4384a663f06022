//! Master manifest capture from completed network requests.
//!
//! Only requests whose path ends in the master manifest name are kept;
//! per-quality and per-track playlists are noise. A capture with no lesson
//! selected lands in a synthesized [`FALLBACK_LESSON_TITLE`] lesson so that
//! a stream seen before any title change is never lost.

use std::fmt;

use tracing::{debug, info, trace};

use crate::policy::StreamPolicy;
use crate::store::SessionStore;
use crate::types::RequestCompleted;

/// Title of the lesson created for captures that precede any navigation.
pub const FALLBACK_LESSON_TITLE: &str = "Introduction";

/// Why a completed request was not captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSkip {
    SessionInactive,
    NotMasterManifest,
}

impl fmt::Display for StreamSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionInactive => write!(f, "session inactive"),
            Self::NotMasterManifest => write!(f, "not a master manifest"),
        }
    }
}

/// Result of classifying one completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Ignored(StreamSkip),
    /// Already recorded in the selected lesson.
    Duplicate { lesson_index: usize },
    Captured { lesson_index: usize },
}

/// Applies completed requests to the session store.
#[derive(Debug)]
pub struct StreamClassifier {
    policy: Box<dyn StreamPolicy>,
}

impl StreamClassifier {
    #[must_use]
    pub fn new(policy: Box<dyn StreamPolicy>) -> Self {
        Self { policy }
    }

    pub fn observe(&self, store: &mut SessionStore, event: &RequestCompleted) -> StreamOutcome {
        if !store.is_active() {
            trace!(url = %event.url, "Request ignored, session inactive");
            return StreamOutcome::Ignored(StreamSkip::SessionInactive);
        }
        if !self.policy.is_master_manifest(&event.url) {
            trace!(url = %event.url, "Request is not a master manifest");
            return StreamOutcome::Ignored(StreamSkip::NotMasterManifest);
        }

        let lesson_index = match store.session().current_lesson_index {
            Some(index) => index,
            None => {
                let index = store.open_lesson(FALLBACK_LESSON_TITLE);
                info!(index, "Opened fallback lesson for stream without navigation");
                index
            }
        };

        match store.record_url(&event.url) {
            Some(true) => {
                info!(lesson_index, url = %event.url, "Stream captured");
                StreamOutcome::Captured { lesson_index }
            }
            // A lesson is always selected by this point.
            Some(false) | None => {
                debug!(lesson_index, url = %event.url, "Stream already captured");
                StreamOutcome::Duplicate { lesson_index }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ManifestSuffixPolicy;

    fn classifier() -> StreamClassifier {
        StreamClassifier::new(Box::new(ManifestSuffixPolicy::default()))
    }

    fn active_store() -> SessionStore {
        let mut store = SessionStore::new("Untitled Project");
        store.start(None);
        store
    }

    fn request(url: &str) -> RequestCompleted {
        RequestCompleted {
            url: url.to_string(),
        }
    }

    #[test]
    fn ignored_while_inactive() {
        let mut store = SessionStore::new("x");
        assert_eq!(
            classifier().observe(&mut store, &request("https://cdn/x/main.m3u8")),
            StreamOutcome::Ignored(StreamSkip::SessionInactive)
        );
        assert!(store.session().lessons.is_empty());
    }

    #[test]
    fn manifest_without_navigation_creates_introduction() {
        let mut store = active_store();
        let outcome = classifier().observe(&mut store, &request(".../main.m3u8"));

        assert_eq!(outcome, StreamOutcome::Captured { lesson_index: 0 });
        let session = store.session();
        assert_eq!(session.lessons.len(), 1);
        assert_eq!(session.lessons[0].title, FALLBACK_LESSON_TITLE);
        assert_eq!(session.lessons[0].urls, vec![".../main.m3u8".to_string()]);
        assert_eq!(session.current_lesson_index, Some(0));
    }

    #[test]
    fn sub_manifest_is_never_captured() {
        let mut store = active_store();
        assert_eq!(
            classifier().observe(&mut store, &request(".../audio.m3u8")),
            StreamOutcome::Ignored(StreamSkip::NotMasterManifest)
        );
        assert!(store.session().lessons.is_empty());
    }

    #[test]
    fn same_url_twice_stored_once() {
        let mut store = active_store();
        let cls = classifier();

        cls.observe(&mut store, &request("https://cdn/a/main.m3u8"));
        let second = cls.observe(&mut store, &request("https://cdn/a/main.m3u8"));

        assert_eq!(second, StreamOutcome::Duplicate { lesson_index: 0 });
        assert_eq!(store.session().lessons[0].urls.len(), 1);
    }

    #[test]
    fn captures_into_selected_lesson_keeping_query() {
        let mut store = active_store();
        store.open_lesson("Lesson 1");
        store.open_lesson("Lesson 2");

        classifier().observe(&mut store, &request(".../720/main.m3u8?x=1"));

        let session = store.session();
        assert!(session.lessons[0].urls.is_empty());
        assert_eq!(
            session.lessons[1].urls,
            vec![".../720/main.m3u8?x=1".to_string()]
        );
    }

    #[test]
    fn fallback_lesson_is_reused_for_later_streams() {
        let mut store = active_store();
        let cls = classifier();

        cls.observe(&mut store, &request("https://cdn/a/main.m3u8"));
        cls.observe(&mut store, &request("https://cdn/b/main.m3u8"));

        let session = store.session();
        assert_eq!(session.lessons.len(), 1);
        assert_eq!(session.lessons[0].urls.len(), 2);
    }
}
