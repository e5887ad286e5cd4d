//! Error types for capture sessions.

use pipview_capture::CaptureError;
use pipview_ipc::SessionId;
use thiserror::Error;

/// Errors returned by sessions and the session registry.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was stopped for good and cannot be used again.
    #[error("Capture session is closed")]
    Closed,

    /// The platform capture service failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The session is not held by the registry.
    #[error("Session {0} is not registered")]
    NotRegistered(SessionId),

    /// No session at the given position.
    #[error("No session at index {index} (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
