//! Events sent from capture sessions to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::state::{SessionState, StopReason};
use crate::types::{CaptureSourceInfo, Size};

/// Identifier of a capture session, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Events that a capture session can send to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Session state has changed.
    StateChanged {
        id: SessionId,

        /// Previous state.
        previous: SessionState,

        /// Current state.
        current: SessionState,
    },

    /// The captured source was resolved or replaced.
    SourceChanged {
        id: SessionId,
        source: CaptureSourceInfo,
    },

    /// Delivered frames changed dimensions.
    ContentSizeChanged { id: SessionId, size: Size },

    /// The source stopped or resumed producing frames.
    InactivityChanged { id: SessionId, inactive: bool },

    /// Audio started or stopped playing.
    AudioActivityChanged { id: SessionId, playing: bool },

    /// The session stopped for good. Sent exactly once per session that
    /// ever ran.
    Stopped { id: SessionId, reason: StopReason },
}

impl SessionEvent {
    /// The session this event belongs to.
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::StateChanged { id, .. }
            | Self::SourceChanged { id, .. }
            | Self::ContentSizeChanged { id, .. }
            | Self::InactivityChanged { id, .. }
            | Self::AudioActivityChanged { id, .. }
            | Self::Stopped { id, .. } => *id,
        }
    }
}
