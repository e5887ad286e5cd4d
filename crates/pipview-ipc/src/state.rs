//! Capture session state machine types.

use serde::{Deserialize, Serialize};

use crate::types::{CaptureSourceInfo, Size};

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created but never started.
    #[default]
    NotSetUp,

    /// Stream open and delivering frames.
    Running,

    /// Stream closed, session retained for resume.
    Paused,

    /// Fully torn down. Terminal.
    Stopped,
}

impl SessionState {
    /// Returns true while the session holds a stream or can resume one.
    ///
    /// This is the flag the presentation layer watches: it turns false
    /// exactly once, when the session stops for good.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Returns true if the session is paused.
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the session is stopped and cannot be reused.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns a simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::NotSetUp => "NotSetUp",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

/// Reason a session stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Closed by its owner.
    Closed,

    /// The platform stream could not be opened.
    OpenFailed { message: String },

    /// The platform stream failed while delivering.
    StreamFailed { message: String },

    /// The event sequence ended without being asked to.
    StreamEnded,
}

impl StopReason {
    /// Returns a display message for this reason.
    pub fn message(&self) -> String {
        match self {
            Self::Closed => "Capture closed".to_string(),
            Self::OpenFailed { message } => format!("Failed to start capture: {message}"),
            Self::StreamFailed { message } => format!("Capture failed: {message}"),
            Self::StreamEnded => "Capture ended".to_string(),
        }
    }

    /// Returns true if the session stopped because of an error.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Snapshot of everything the presentation layer reads from a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Current lifecycle state.
    pub state: SessionState,

    /// Size of the last delivered frame.
    pub content_size: Size,

    /// Whether the last audio packet contained any sound.
    pub is_playing_audio: bool,

    /// Whether the source has stopped producing frames.
    pub is_inactive: bool,

    /// The source currently being captured, once resolved.
    pub source: Option<CaptureSourceInfo>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::NotSetUp,
            content_size: Size::new(1.0, 1.0),
            is_playing_audio: false,
            is_inactive: false,
            source: None,
        }
    }
}

impl SessionStatus {
    /// Shorthand for `self.state.is_running()`.
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Shorthand for `self.state.is_paused()`.
    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }
}
