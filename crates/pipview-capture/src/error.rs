//! Error types for the capture module.

use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Displays and windows could not be listed.
    #[error("Failed to enumerate capturable content: {0}")]
    Enumeration(String),

    /// Permission denied for capture.
    #[error("Permission denied for capture")]
    PermissionDenied,

    /// Capture source not found.
    #[error("Capture source not found: {0}")]
    SourceNotFound(String),

    /// The platform stream could not be created or started.
    #[error("Failed to open capture stream: {0}")]
    StreamOpen(String),

    /// The platform stream failed while delivering samples.
    #[error("Capture stream failed: {0}")]
    StreamRuntime(String),

    /// The platform stream could not be stopped cleanly.
    #[error("Failed to stop capture stream: {0}")]
    StreamStop(String),

    /// The running stream rejected a new configuration or filter.
    #[error("Failed to update capture stream: {0}")]
    Reconfigure(String),

    /// Crop rectangle outside the window it belongs to.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Frame conversion error.
    #[error("Frame conversion error: {0}")]
    FrameConversion(String),
}
