//! Stream configuration derived from a capture source.

use std::time::Duration;

use pipview_ipc::{PreviewSettings, Rect};

use crate::content::{DisplayId, WindowId};
use crate::frame::PixelFormat;
use crate::source::CaptureSource;

/// Parameters of a platform stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfiguration {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Pixel format of delivered frames.
    pub pixel_format: PixelFormat,

    /// Shortest interval between two delivered frames.
    pub minimum_frame_interval: Duration,

    /// Deliver audio packets alongside frames.
    pub captures_audio: bool,

    /// Leave this process's own audio out of the captured audio.
    pub excludes_current_process_audio: bool,
}

/// What a platform stream subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
    /// A whole display, minus some windows.
    Display {
        display: DisplayId,
        excluded_windows: Vec<WindowId>,
    },

    /// A single window.
    Window(WindowId),
}

/// Everything needed to open or reconfigure a stream for a source.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPlan {
    pub configuration: StreamConfiguration,
    pub filter: ContentFilter,

    /// Rectangle cut out of every frame, for regions.
    pub crop: Option<Rect>,
}

impl StreamPlan {
    /// Derive the stream plan for `source` under the current settings.
    ///
    /// Regions stream the full window; the crop is applied per frame.
    pub fn derive(source: &CaptureSource, settings: &PreviewSettings) -> Self {
        let (width, height) = dimensions(source);

        Self {
            configuration: StreamConfiguration {
                width,
                height,
                pixel_format: PixelFormat::Bgra8,
                minimum_frame_interval: settings.frame_interval(),
                captures_audio: true,
                excludes_current_process_audio: false,
            },
            filter: content_filter(source),
            crop: crop(source),
        }
    }
}

fn dimensions(source: &CaptureSource) -> (u32, u32) {
    match source {
        CaptureSource::Display(display) => (display.width, display.height),
        CaptureSource::Window(window) => (window.width(), window.height()),
        CaptureSource::Region(region) => (region.window().width(), region.window().height()),
    }
}

fn content_filter(source: &CaptureSource) -> ContentFilter {
    match source {
        CaptureSource::Display(display) => ContentFilter::Display {
            display: display.id,
            excluded_windows: Vec::new(),
        },
        CaptureSource::Window(window) => ContentFilter::Window(window.id),
        CaptureSource::Region(region) => ContentFilter::Window(region.window().id),
    }
}

fn crop(source: &CaptureSource) -> Option<Rect> {
    match source {
        CaptureSource::Display(_) | CaptureSource::Window(_) => None,
        CaptureSource::Region(region) => Some(*region.crop()),
    }
}
