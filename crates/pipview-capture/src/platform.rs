//! The platform capture API, as seen by the core.

use async_trait::async_trait;
use tracing::warn;

use crate::config::{ContentFilter, StreamConfiguration};
use crate::content::{ContentOptions, ShareableContent};
use crate::output::StreamOutput;
use crate::CaptureResult;

/// Source enumeration and stream creation.
///
/// Implementations wrap the operating system's capture service. All
/// methods may be called from any task.
#[async_trait]
pub trait CapturePlatform: Send + Sync {
    /// List the displays and windows that can be captured.
    async fn shareable_content(&self, options: ContentOptions) -> CaptureResult<ShareableContent>;

    /// Bundle identifier of this application, used to hide its own windows.
    fn own_bundle_identifier(&self) -> Option<String>;

    /// Create and start a stream.
    ///
    /// The stream feeds `output` from its delivery threads until it is
    /// stopped or fails.
    async fn open_stream(
        &self,
        filter: &ContentFilter,
        configuration: &StreamConfiguration,
        output: StreamOutput,
    ) -> CaptureResult<Box<dyn PlatformStream>>;
}

/// A running platform stream.
#[async_trait]
pub trait PlatformStream: Send {
    /// Apply new stream parameters without interrupting delivery.
    async fn update_configuration(&mut self, configuration: &StreamConfiguration) -> CaptureResult<()>;

    /// Point the stream at different content without interrupting delivery.
    async fn update_content_filter(&mut self, filter: &ContentFilter) -> CaptureResult<()>;

    /// Stop delivery. Completes once no further samples will be delivered.
    async fn stop_capture(&mut self) -> CaptureResult<()>;
}

/// Returns true if this process may capture the screen.
///
/// Enumeration is refused without permission, so a successful listing is
/// taken as proof.
pub async fn has_capture_permission(platform: &dyn CapturePlatform) -> bool {
    match platform.shareable_content(ContentOptions::default()).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Screen capture permission check failed: {}", e);
            false
        }
    }
}
