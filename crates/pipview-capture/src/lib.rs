//! Capture sources, frames and stream configuration.
//!
//! This crate describes what can be captured (displays, windows and
//! regions of windows), derives platform stream parameters from a chosen
//! source, and turns raw platform samples into presentable frames. The
//! platform capture service itself sits behind [`CapturePlatform`].

mod config;
mod content;
mod error;
mod frame;
mod output;
mod platform;
mod source;

pub use config::{ContentFilter, StreamConfiguration, StreamPlan};
pub use content::{
    ContentOptions, DisplayId, DisplayInfo, RunningApplication, ShareableContent, WindowFilter,
    WindowId, WindowInfo,
};
pub use error::CaptureError;
pub use frame::{CapturedFrame, Frame, FrameStatus, PixelFormat, PixelImage, VideoSample};
pub use output::{CropHandle, StreamMessage, StreamOutput};
pub use platform::{has_capture_permission, CapturePlatform, PlatformStream};
pub use source::{CaptureKind, CaptureSource, CaptureTarget, Region};

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
