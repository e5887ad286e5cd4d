//! The desktop window system, as seen by the selector.

use pipview_ipc::{Point, Rect};

/// A window from the window server's on-screen list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedWindow {
    /// Bounds in capture coordinates (top-left origin).
    pub bounds: Rect,

    /// Window layer. Normal application windows sit on layer 0.
    pub layer: i32,

    /// Process owning the window.
    pub owner_pid: i32,
}

/// Appearance of a surface raised by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStyle {
    /// Translucent rectangle marking the current pick.
    Highlight,

    /// Invisible full-screen surface that receives drags.
    Overlay,
}

/// A borderless surface floating above every application window.
pub trait OverlaySurface: Send {
    /// Move and resize the surface. `frame` is in screen coordinates.
    fn set_frame(&mut self, frame: Rect);

    fn close(&mut self);
}

/// Window system services used while selecting.
///
/// Screen coordinates have their origin at the bottom left of the primary
/// screen, with y growing upwards.
pub trait WindowSystem: Send + Sync {
    /// Frames of the connected screens, primary screen first.
    fn screens(&self) -> Vec<Rect>;

    /// On-screen windows, front to back.
    fn window_list(&self) -> Vec<ListedWindow>;

    /// Raise a new surface at `frame`.
    fn create_surface(&self, style: SurfaceStyle, frame: Rect) -> Box<dyn OverlaySurface>;

    fn push_crosshair_cursor(&self);

    fn pop_cursor(&self);
}

/// Keys the selector reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(u16),
}

/// Pointer and keyboard input, with pointer locations in screen
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    PointerMove(Point),
    Drag(Point),
    DragEnd(Point),
    Click(Point),
}

impl InputEvent {
    /// Pointer location, for pointer events.
    pub fn location(&self) -> Option<Point> {
        match self {
            Self::Key(_) => None,
            Self::PointerMove(p) | Self::Drag(p) | Self::DragEnd(p) | Self::Click(p) => Some(*p),
        }
    }
}
