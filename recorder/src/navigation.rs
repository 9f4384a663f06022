//! Lesson boundary detection from tab title changes.
//!
//! Every title change from every tab reaches [`NavigationObserver::observe`].
//! The observer filters out noise (inactive session, background tabs,
//! URL-shaped loading titles), normalizes what is left, and opens a new
//! lesson whenever the normalized title differs from the selected lesson's
//! title. Repeated titles collapse only when they are consecutive.

use std::fmt;

use tracing::{debug, info};

use crate::policy::{TitlePolicy, TitleRejection};
use crate::store::SessionStore;
use crate::types::TabTitleChanged;

/// Why a title change did not open a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSkip {
    SessionInactive,
    BackgroundTab,
    Title(TitleRejection),
}

impl fmt::Display for NavigationSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionInactive => write!(f, "session inactive"),
            Self::BackgroundTab => write!(f, "tab is not in the foreground"),
            Self::Title(rejection) => write!(f, "{rejection}"),
        }
    }
}

/// Result of applying one title change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Ignored(NavigationSkip),
    /// Same title as the selected lesson.
    Unchanged,
    Opened { index: usize, title: String },
}

/// Applies title changes to the session store.
#[derive(Debug)]
pub struct NavigationObserver {
    policy: Box<dyn TitlePolicy>,
}

impl NavigationObserver {
    #[must_use]
    pub fn new(policy: Box<dyn TitlePolicy>) -> Self {
        Self { policy }
    }

    pub fn observe(&self, store: &mut SessionStore, event: &TabTitleChanged) -> NavigationOutcome {
        let outcome = self.apply(store, event);

        match &outcome {
            NavigationOutcome::Opened { index, title } => {
                info!(tab_id = event.tab_id, index, title = %title, "Lesson opened");
            }
            NavigationOutcome::Unchanged => {
                debug!(tab_id = event.tab_id, "Title matches current lesson");
            }
            NavigationOutcome::Ignored(reason) => {
                debug!(tab_id = event.tab_id, reason = %reason, "Title change ignored");
            }
        }

        outcome
    }

    fn apply(&self, store: &mut SessionStore, event: &TabTitleChanged) -> NavigationOutcome {
        if !store.is_active() {
            return NavigationOutcome::Ignored(NavigationSkip::SessionInactive);
        }
        if !event.is_active_tab {
            return NavigationOutcome::Ignored(NavigationSkip::BackgroundTab);
        }

        let title = match self.policy.normalize(&event.new_title) {
            Ok(title) => title,
            Err(rejection) => return NavigationOutcome::Ignored(NavigationSkip::Title(rejection)),
        };

        if store.current_lesson_title() == Some(title.as_str()) {
            return NavigationOutcome::Unchanged;
        }

        let index = store.open_lesson(title.clone());
        NavigationOutcome::Opened { index, title }
    }
}
