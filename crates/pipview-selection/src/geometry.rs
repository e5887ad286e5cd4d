//! Coordinate conversions and selection rectangles.

use pipview_ipc::{Point, Rect};

/// Converts between screen coordinates (bottom-left origin, y up) and
/// capture coordinates (top-left origin, y down).
///
/// Both spaces share the primary screen's left edge and differ by a flip
/// around the primary screen's height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSpace {
    primary_height: f64,
}

impl ScreenSpace {
    pub fn new(primary_height: f64) -> Self {
        Self { primary_height }
    }

    /// Build from the screen list. The first screen is the primary one.
    pub fn from_screens(screens: &[Rect]) -> Option<Self> {
        screens.first().map(|primary| Self::new(primary.max_y()))
    }

    pub fn to_capture_point(&self, point: Point) -> Point {
        Point::new(point.x, self.primary_height - point.y)
    }

    pub fn to_screen_rect(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x,
            self.primary_height - rect.max_y(),
            rect.width,
            rect.height,
        )
    }
}

/// Rectangle spanned by a drag from `origin` to `pointer`, kept inside
/// `window`.
///
/// Each axis is clamped on its own: the pointer coordinate is limited to
/// the window's extent on that axis and the span runs from the clamped
/// coordinate to the origin's.
pub fn selection_rect(origin: Point, pointer: Point, window: &Rect) -> Rect {
    let x = pointer.x.clamp(window.min_x(), window.max_x());
    let y = pointer.y.clamp(window.min_y(), window.max_y());

    let (x1, x2) = (x.min(origin.x), x.max(origin.x));
    let (y1, y2) = (y.min(origin.y), y.max(origin.y));

    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// Express a screen-space selection inside `window` (also screen space) in
/// the window's local top-left-origin coordinates, truncated to whole
/// points.
pub fn window_local_rect(selection: &Rect, window: &Rect) -> Rect {
    let x = selection.min_x() - window.min_x();
    let y = window.height - (selection.min_y() - window.min_y()) - selection.height;

    Rect::new(
        x.trunc(),
        y.trunc(),
        selection.width.trunc(),
        selection.height.trunc(),
    )
}
