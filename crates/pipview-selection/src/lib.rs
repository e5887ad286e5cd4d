//! Interactive source selection for pipview.
//!
//! [`RegionSelector`] lets the user point at a display, click a window, or
//! drag out a region of a window. The window system it draws on is
//! abstracted by [`WindowSystem`].

mod geometry;
mod selector;
mod window_system;

pub use geometry::{selection_rect, window_local_rect, ScreenSpace};
pub use selector::{OnSelect, RegionSelector};
pub use window_system::{InputEvent, Key, ListedWindow, OverlaySurface, SurfaceStyle, WindowSystem};
