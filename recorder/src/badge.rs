//! Per-tab badge state driven by content-detector notifications.
//!
//! The content detector scans each page for `<video>`, `<iframe>` and
//! `.m3u8` anchors and reports a count. The count only decorates the
//! extension icon for that tab; it never touches the recording session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Badge background used whenever a count is shown (indigo-500).
pub const BADGE_COLOR: &str = "#6366f1";

/// What the extension icon should display for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Empty when the badge is cleared.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl Badge {
    /// The cleared badge.
    #[must_use]
    pub fn cleared() -> Self {
        Self {
            text: String::new(),
            background_color: None,
        }
    }

    #[must_use]
    pub fn for_count(count: u32) -> Self {
        if count == 0 {
            return Self::cleared();
        }
        Self {
            text: count.to_string(),
            background_color: Some(BADGE_COLOR.to_string()),
        }
    }
}

/// Badge state for every tab that has reported.
///
/// Reports without a tab id are kept under a single global entry.
#[derive(Debug, Default, Clone)]
pub struct BadgeBoard {
    badges: HashMap<Option<i64>, Badge>,
}

impl BadgeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tabs currently showing a count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.badges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Records a detector report and returns the badge to display.
    pub fn report(&mut self, tab_id: Option<i64>, count: u32) -> Badge {
        let badge = Badge::for_count(count);
        debug!(?tab_id, count, text = %badge.text, "Badge updated");
        if count == 0 {
            self.badges.remove(&tab_id);
        } else {
            self.badges.insert(tab_id, badge.clone());
        }
        badge
    }

    /// Badge for `tab_id`; tabs that never reported show a cleared badge.
    #[must_use]
    pub fn get(&self, tab_id: Option<i64>) -> Badge {
        self.badges
            .get(&tab_id)
            .cloned()
            .unwrap_or_else(Badge::cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_count_shows_text_and_color() {
        let badge = Badge::for_count(3);
        assert_eq!(badge.text, "3");
        assert_eq!(badge.background_color.as_deref(), Some(BADGE_COLOR));
    }

    #[test]
    fn zero_count_clears_badge() {
        assert_eq!(Badge::for_count(0), Badge::cleared());
    }

    #[test]
    fn board_tracks_tabs_independently() {
        let mut board = BadgeBoard::new();
        board.report(Some(1), 2);
        board.report(Some(2), 5);

        assert_eq!(board.get(Some(1)).text, "2");
        assert_eq!(board.get(Some(2)).text, "5");
        assert_eq!(board.get(Some(3)), Badge::cleared());
    }

    #[test]
    fn later_zero_report_clears_tab() {
        let mut board = BadgeBoard::new();
        board.report(Some(1), 4);
        board.report(Some(1), 0);
        assert_eq!(board.get(Some(1)), Badge::cleared());
    }

    #[test]
    fn cleared_tabs_are_forgotten() {
        let mut board = BadgeBoard::new();
        board.report(Some(1), 4);
        board.report(Some(2), 1);
        assert_eq!(board.len(), 2);

        board.report(Some(1), 0);
        board.report(Some(3), 0);

        assert_eq!(board.len(), 1);
        assert_eq!(board.get(Some(2)).text, "1");
        board.report(Some(2), 0);
        assert!(board.is_empty());
    }

    #[test]
    fn cleared_badge_omits_color_in_json() {
        let json = serde_json::to_string(&Badge::cleared()).unwrap();
        assert_eq!(json, r#"{"text":""}"#);
    }
}
