//! Displays and windows available for capture.

use pipview_ipc::{CaptureSourceInfo, CaptureSourceType, Rect};

/// Platform handle of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub u32);

/// Platform handle of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Display information for capture.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    /// Display handle.
    pub id: DisplayId,

    /// Bounds in global capture coordinates (top-left origin).
    pub frame: Rect,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl DisplayInfo {
    /// Convert to a source summary for the UI.
    pub fn to_source_info(&self) -> CaptureSourceInfo {
        CaptureSourceInfo {
            id: format!("display:{}", self.id.0),
            name: format!("Display {}", self.id.0),
            source_type: CaptureSourceType::Display,
            width: self.width,
            height: self.height,
        }
    }
}

/// The application owning a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApplication {
    pub name: String,
    pub bundle_identifier: String,
    pub process_id: i32,
}

/// Window information for capture.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    /// Window handle.
    pub id: WindowId,

    /// Window title, if the platform exposes one.
    pub title: Option<String>,

    /// Bounds in global capture coordinates (top-left origin).
    pub frame: Rect,

    /// Owning application.
    pub owning_application: Option<RunningApplication>,

    /// Whether the window is currently on screen.
    pub is_on_screen: bool,
}

impl WindowInfo {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.frame.width.max(0.0) as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.frame.height.max(0.0) as u32
    }

    /// Name shown to the user: the title, else the owning application.
    pub fn display_name(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.owning_application.as_ref().map(|a| a.name.clone()))
            .unwrap_or_else(|| format!("Window {}", self.id.0))
    }

    /// Convert to a source summary for the UI.
    pub fn to_source_info(&self) -> CaptureSourceInfo {
        CaptureSourceInfo {
            id: format!("window:{}", self.id.0),
            name: self.display_name(),
            source_type: CaptureSourceType::Window,
            width: self.width(),
            height: self.height(),
        }
    }

    fn application_name(&self) -> &str {
        self.owning_application
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("")
    }
}

/// Options for an enumeration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentOptions {
    /// Leave desktop-level windows (wallpaper, icons) out.
    pub exclude_desktop_windows: bool,

    /// Only list windows currently on screen.
    pub on_screen_windows_only: bool,
}

/// Everything the platform can capture right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareableContent {
    pub displays: Vec<DisplayInfo>,
    pub windows: Vec<WindowInfo>,
}

impl ShareableContent {
    /// Find a display by handle.
    pub fn display(&self, id: DisplayId) -> Option<&DisplayInfo> {
        self.displays.iter().find(|d| d.id == id)
    }

    /// Find a window by handle.
    pub fn window(&self, id: WindowId) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Windows a user may pick, in display order.
    pub fn capturable_windows(&self, filter: &WindowFilter) -> Vec<WindowInfo> {
        filter.apply(&self.windows)
    }
}

/// Rules deciding which windows can be captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowFilter {
    /// Bundle identifier of this application; its windows are skipped.
    pub excluded_bundle_id: Option<String>,

    /// Skip windows that are not on screen.
    pub on_screen_only: bool,
}

impl WindowFilter {
    /// Keep windows owned by a named application other than this one,
    /// sorted by application name.
    pub fn apply(&self, windows: &[WindowInfo]) -> Vec<WindowInfo> {
        let mut kept: Vec<WindowInfo> = windows
            .iter()
            .filter(|w| !w.application_name().is_empty())
            .filter(|w| match (&self.excluded_bundle_id, &w.owning_application) {
                (Some(excluded), Some(app)) => &app.bundle_identifier != excluded,
                _ => true,
            })
            .filter(|w| !self.on_screen_only || w.is_on_screen)
            .cloned()
            .collect();

        kept.sort_by(|a, b| a.application_name().cmp(b.application_name()));
        kept
    }
}
