//! What a session captures.

use pipview_ipc::{CaptureSourceInfo, CaptureSourceType, Rect, Size};

use crate::content::{DisplayInfo, ShareableContent, WindowFilter, WindowInfo};
use crate::error::CaptureError;
use crate::CaptureResult;

/// The three kinds of capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Display,
    Window,
    Region,
}

impl CaptureKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Window => "window",
            Self::Region => "window portion",
        }
    }
}

/// A rectangular portion of a window.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    window: WindowInfo,
    crop: Rect,
}

impl Region {
    /// Create a region from a crop rectangle in the window's local,
    /// top-left-origin coordinates.
    ///
    /// The rectangle must have an area and lie within
    /// `[0, width] x [0, height]` of the window.
    pub fn new(window: WindowInfo, crop: Rect) -> CaptureResult<Self> {
        let bounds = Rect::from_size(window.frame.size());

        if crop.is_empty() || !crop.x.is_finite() || !crop.y.is_finite() {
            return Err(CaptureError::InvalidRegion(format!(
                "crop {crop:?} has no area"
            )));
        }

        if !bounds.contains_rect(&crop) {
            return Err(CaptureError::InvalidRegion(format!(
                "crop {crop:?} outside {}x{} window",
                bounds.width, bounds.height
            )));
        }

        Ok(Self { window, crop })
    }

    /// A region covering the whole window.
    pub fn full_window(window: WindowInfo) -> Self {
        let crop = Rect::from_size(window.frame.size());
        Self { window, crop }
    }

    pub fn window(&self) -> &WindowInfo {
        &self.window
    }

    /// Crop rectangle in window-local, top-left-origin coordinates.
    pub fn crop(&self) -> &Rect {
        &self.crop
    }
}

/// A resolved capture source.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureSource {
    Display(DisplayInfo),
    Window(WindowInfo),
    Region(Region),
}

impl CaptureSource {
    pub fn kind(&self) -> CaptureKind {
        match self {
            Self::Display(_) => CaptureKind::Display,
            Self::Window(_) => CaptureKind::Window,
            Self::Region(_) => CaptureKind::Region,
        }
    }

    /// Size of the content a preview of this source shows.
    pub fn size(&self) -> Size {
        match self {
            Self::Display(display) => display.frame.size(),
            Self::Window(window) => window.frame.size(),
            Self::Region(region) => region.crop.size(),
        }
    }

    /// Convert to a source summary for the UI.
    pub fn to_source_info(&self) -> CaptureSourceInfo {
        match self {
            Self::Display(display) => display.to_source_info(),
            Self::Window(window) => window.to_source_info(),
            Self::Region(region) => {
                let mut info = region.window.to_source_info();
                info.source_type = CaptureSourceType::Region;
                info.width = region.crop.width as u32;
                info.height = region.crop.height as u32;
                info
            }
        }
    }

    /// The default source of a kind: the first display, the first
    /// capturable window, or the whole of the first capturable window.
    pub fn first_available(
        kind: CaptureKind,
        content: &ShareableContent,
        filter: &WindowFilter,
    ) -> Option<Self> {
        match kind {
            CaptureKind::Display => content.displays.first().cloned().map(Self::Display),
            CaptureKind::Window => content
                .capturable_windows(filter)
                .into_iter()
                .next()
                .map(Self::Window),
            CaptureKind::Region => content
                .capturable_windows(filter)
                .into_iter()
                .next()
                .map(|w| Self::Region(Region::full_window(w))),
        }
    }
}

/// What a session has been asked to capture.
///
/// A session created without a concrete source starts out `Unset` and
/// resolves to the first available source of the requested kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureTarget {
    Unset(CaptureKind),
    Resolved(CaptureSource),
}

impl CaptureTarget {
    pub fn kind(&self) -> CaptureKind {
        match self {
            Self::Unset(kind) => *kind,
            Self::Resolved(source) => source.kind(),
        }
    }

    pub fn source(&self) -> Option<&CaptureSource> {
        match self {
            Self::Unset(_) => None,
            Self::Resolved(source) => Some(source),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl Default for CaptureTarget {
    fn default() -> Self {
        Self::Unset(CaptureKind::Display)
    }
}

impl From<CaptureSource> for CaptureTarget {
    fn from(source: CaptureSource) -> Self {
        Self::Resolved(source)
    }
}
