//! The single-owner engine that serializes every inbound event.
//!
//! Title changes, completed requests, control messages and detector reports
//! all travel through one bounded queue to one task. That task owns the
//! [`Recorder`] and applies each command to completion before taking the
//! next, so the relative order of navigation and network events is exactly
//! their arrival order on the queue and nothing else.
//!
//! # Example
//!
//! ```rust
//! use grabber_recorder::engine::Recorder;
//! use grabber_recorder::protocol::ControlMessage;
//! use grabber_recorder::types::{RequestCompleted, TabTitleChanged};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (handle, _task) = Recorder::default().spawn(64);
//!
//!     handle
//!         .control(ControlMessage::StartSession { project_name: Some("Algebra".into()) })
//!         .await
//!         .unwrap();
//!     handle
//!         .tab_title_changed(TabTitleChanged {
//!             tab_id: 1,
//!             new_title: "Lesson 1 | Site".into(),
//!             is_active_tab: true,
//!         })
//!         .await
//!         .unwrap();
//!     handle
//!         .request_completed(RequestCompleted { url: "https://cdn/x/main.m3u8".into() })
//!         .await
//!         .unwrap();
//!
//!     let export = handle.export().await.unwrap();
//!     assert_eq!(export.lessons[0].title, "Lesson 1");
//! }
//! ```

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::badge::{Badge, BadgeBoard};
use crate::config::{Config, DEFAULT_PROJECT_NAME};
use crate::navigation::{NavigationObserver, NavigationOutcome};
use crate::policy::{
    ManifestSuffixPolicy, PolicyError, StreamPolicy, SuffixTitlePolicy, TitlePolicy,
};
use crate::protocol::{ControlMessage, ControlResponse};
use crate::store::SessionStore;
use crate::stream::{StreamClassifier, StreamOutcome};
use crate::types::{ProjectExport, RequestCompleted, TabTitleChanged};

/// Errors returned by [`RecorderHandle`] when the engine is unreachable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The engine task has stopped and no longer accepts commands.
    #[error("recorder engine is not running")]
    Closed,

    /// The engine accepted the command but dropped the reply.
    #[error("recorder engine dropped the reply")]
    NoReply,
}

/// Work items on the engine queue.
#[derive(Debug)]
enum Command {
    TitleChanged(TabTitleChanged),
    RequestCompleted(RequestCompleted),
    Control {
        message: ControlMessage,
        reply: oneshot::Sender<Option<ControlResponse>>,
    },
    Export {
        reply: oneshot::Sender<ProjectExport>,
    },
    Badge {
        tab_id: Option<i64>,
        reply: oneshot::Sender<Badge>,
    },
}

/// Owned recording context: the session plus the observers that mutate it.
#[derive(Debug)]
pub struct Recorder {
    store: SessionStore,
    navigation: NavigationObserver,
    streams: StreamClassifier,
    badges: BadgeBoard,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(
            SessionStore::new(DEFAULT_PROJECT_NAME),
            Box::new(SuffixTitlePolicy::default()),
            Box::new(ManifestSuffixPolicy::default()),
        )
    }
}

impl Recorder {
    #[must_use]
    pub fn new(
        store: SessionStore,
        title_policy: Box<dyn TitlePolicy>,
        stream_policy: Box<dyn StreamPolicy>,
    ) -> Self {
        Self {
            store,
            navigation: NavigationObserver::new(title_policy),
            streams: StreamClassifier::new(stream_policy),
            badges: BadgeBoard::new(),
        }
    }

    /// Builds a recorder with the policies described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the configured title pattern or manifest
    /// name is invalid.
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let titles = SuffixTitlePolicy::new(&config.title_suffix_pattern)?;
        let streams = ManifestSuffixPolicy::new(config.manifest_name.clone())?;

        Ok(Self::new(
            SessionStore::new(config.default_project_name.clone()),
            Box::new(titles),
            Box::new(streams),
        ))
    }

    /// Read access to the session store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn on_title_changed(&mut self, event: &TabTitleChanged) -> NavigationOutcome {
        self.navigation.observe(&mut self.store, event)
    }

    pub fn on_request_completed(&mut self, event: &RequestCompleted) -> StreamOutcome {
        self.streams.observe(&mut self.store, event)
    }

    /// Applies a control message, returning the reply if the message has one.
    pub fn on_control(&mut self, message: ControlMessage) -> Option<ControlResponse> {
        debug!(kind = message.kind(), "Control message received");

        match message {
            ControlMessage::StartSession { project_name } => {
                Some(ControlResponse::ack(self.store.start(project_name)))
            }
            ControlMessage::StopSession => Some(ControlResponse::ack(self.store.stop())),
            ControlMessage::GetSession => Some(ControlResponse::snapshot(self.store.snapshot())),
            ControlMessage::VideosFound { count, tab_id } => {
                self.badges.report(tab_id, count);
                None
            }
        }
    }

    #[must_use]
    pub fn badge(&self, tab_id: Option<i64>) -> Badge {
        self.badges.get(tab_id)
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::TitleChanged(event) => {
                self.on_title_changed(&event);
            }
            Command::RequestCompleted(event) => {
                self.on_request_completed(&event);
            }
            Command::Control { message, reply } => {
                let response = self.on_control(message);
                if reply.send(response).is_err() {
                    debug!("Control caller went away before the reply");
                }
            }
            Command::Export { reply } => {
                let _ = reply.send(self.store.export());
            }
            Command::Badge { tab_id, reply } => {
                let _ = reply.send(self.badge(tab_id));
            }
        }
    }

    /// Moves the recorder onto its own task.
    ///
    /// The task ends once every [`RecorderHandle`] has been dropped.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn spawn(self, capacity: usize) -> (RecorderHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let task = tokio::spawn(self.run(rx));
        info!(capacity, "Recorder engine started");
        (RecorderHandle { tx }, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.apply(command);
        }
        info!("Recorder engine stopped");
    }
}

/// Cloneable sender side of the engine queue.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<Command>,
}

impl RecorderHandle {
    /// Enqueues a title change.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine has stopped.
    pub async fn tab_title_changed(&self, event: TabTitleChanged) -> Result<(), EngineError> {
        self.send(Command::TitleChanged(event)).await
    }

    /// Enqueues a completed request.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine has stopped.
    pub async fn request_completed(&self, event: RequestCompleted) -> Result<(), EngineError> {
        self.send(Command::RequestCompleted(event)).await
    }

    /// Sends a control message and waits for its reply.
    ///
    /// `Ok(None)` means the message is one that gets no response.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine has stopped or dropped the reply.
    pub async fn control(
        &self,
        message: ControlMessage,
    ) -> Result<Option<ControlResponse>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Control { message, reply }).await?;
        rx.await.map_err(|_| EngineError::NoReply)
    }

    /// Fetches the export artifact for the current session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine has stopped or dropped the reply.
    pub async fn export(&self) -> Result<ProjectExport, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Export { reply }).await?;
        rx.await.map_err(|_| EngineError::NoReply)
    }

    /// Fetches the badge for a tab.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the engine has stopped or dropped the reply.
    pub async fn badge(&self, tab_id: Option<i64>) -> Result<Badge, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Badge { tab_id, reply }).await?;
        rx.await.map_err(|_| EngineError::NoReply)
    }

    async fn send(&self, command: Command) -> Result<(), EngineError> {
        self.tx.send(command).await.map_err(|_| EngineError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Session;

    fn title(text: &str) -> TabTitleChanged {
        TabTitleChanged {
            tab_id: 1,
            new_title: text.to_string(),
            is_active_tab: true,
        }
    }

    fn request(url: &str) -> RequestCompleted {
        RequestCompleted {
            url: url.to_string(),
        }
    }

    fn start(name: &str) -> ControlMessage {
        ControlMessage::StartSession {
            project_name: Some(name.to_string()),
        }
    }

    async fn session(handle: &RecorderHandle) -> Session {
        handle
            .control(ControlMessage::GetSession)
            .await
            .unwrap()
            .unwrap()
            .session()
            .clone()
    }

    #[test]
    fn start_always_resets() {
        let mut recorder = Recorder::default();
        recorder.on_control(start("One"));
        recorder.on_title_changed(&title("Lesson 1"));
        recorder.on_request_completed(&request("https://cdn/a/main.m3u8"));

        let response = recorder.on_control(start("Two")).unwrap();
        let session = response.session();

        assert!(session.active);
        assert!(session.lessons.is_empty());
        assert_eq!(session.current_lesson_index, None);
    }

    #[test]
    fn videos_found_has_no_reply_and_leaves_session_alone() {
        let mut recorder = Recorder::default();
        recorder.on_control(start("One"));
        let before = recorder.store().snapshot();

        let reply = recorder.on_control(ControlMessage::VideosFound {
            count: 4,
            tab_id: Some(3),
        });

        assert!(reply.is_none());
        assert_eq!(recorder.store().snapshot(), before);
        assert_eq!(recorder.badge(Some(3)).text, "4");
    }

    #[test]
    fn get_is_read_only() {
        let mut recorder = Recorder::default();
        recorder.on_control(start("One"));
        let a = recorder.on_control(ControlMessage::GetSession).unwrap();
        let b = recorder.on_control(ControlMessage::GetSession).unwrap();
        assert_eq!(a, b);
        assert!(matches!(a, ControlResponse::Snapshot { .. }));
    }

    #[test]
    fn from_config_rejects_bad_pattern() {
        let config = Config {
            title_suffix_pattern: "([".to_string(),
            ..Config::default()
        };
        assert!(Recorder::from_config(&config).is_err());
    }

    #[test]
    fn from_config_uses_custom_manifest_and_default_name() {
        let config = Config {
            manifest_name: "master.m3u8".to_string(),
            default_project_name: "My Course".to_string(),
            ..Config::default()
        };
        let mut recorder = Recorder::from_config(&config).unwrap();
        let response = recorder
            .on_control(ControlMessage::StartSession { project_name: None })
            .unwrap();
        assert_eq!(response.session().project_name, "My Course");

        recorder.on_request_completed(&request("https://cdn/a/main.m3u8"));
        recorder.on_request_completed(&request("https://cdn/a/master.m3u8"));

        let session = recorder.store().snapshot();
        assert_eq!(session.lessons.len(), 1);
        assert_eq!(session.lessons[0].urls, vec!["https://cdn/a/master.m3u8"]);
    }

    #[tokio::test]
    async fn events_apply_in_arrival_order() {
        let (handle, _task) = Recorder::default().spawn(8);

        handle.control(start("Algebra")).await.unwrap();
        handle.tab_title_changed(title("Lesson 1 | Site")).await.unwrap();
        handle.request_completed(request(".../main.m3u8")).await.unwrap();
        handle.tab_title_changed(title("Lesson 2 | Site")).await.unwrap();
        handle
            .request_completed(request(".../720/main.m3u8?x=1"))
            .await
            .unwrap();

        let session = session(&handle).await;
        assert_eq!(session.lessons.len(), 2);
        assert_eq!(session.lessons[0].urls, vec![".../main.m3u8"]);
        assert_eq!(session.lessons[1].urls, vec![".../720/main.m3u8?x=1"]);
    }

    #[tokio::test]
    async fn stop_twice_is_stable_through_handle() {
        let (handle, _task) = Recorder::default().spawn(8);
        handle.control(start("Algebra")).await.unwrap();

        let first = handle.control(ControlMessage::StopSession).await.unwrap();
        let second = handle.control(ControlMessage::StopSession).await.unwrap();

        assert_eq!(first, second);
        assert!(!first.unwrap().session().active);
    }

    #[tokio::test]
    async fn events_after_stop_are_ignored() {
        let (handle, _task) = Recorder::default().spawn(8);
        handle.control(start("Algebra")).await.unwrap();
        handle.tab_title_changed(title("Lesson 1")).await.unwrap();
        handle.control(ControlMessage::StopSession).await.unwrap();

        handle.tab_title_changed(title("Lesson 2")).await.unwrap();
        handle
            .request_completed(request("https://cdn/a/main.m3u8"))
            .await
            .unwrap();

        let export = handle.export().await.unwrap();
        assert_eq!(export.lessons.len(), 1);
        assert!(export.lessons[0].urls.is_empty());
    }

    #[tokio::test]
    async fn badge_query_through_handle() {
        let (handle, _task) = Recorder::default().spawn(8);
        let reply = handle
            .control(ControlMessage::VideosFound {
                count: 2,
                tab_id: None,
            })
            .await
            .unwrap();

        assert!(reply.is_none());
        assert_eq!(handle.badge(None).await.unwrap().text, "2");
    }

    #[tokio::test]
    async fn handle_reports_closed_engine() {
        let (handle, task) = Recorder::default().spawn(1);
        task.abort();
        let _ = task.await;

        let err = handle.control(ControlMessage::GetSession).await.unwrap_err();
        assert_eq!(err, EngineError::Closed);
    }
}
