//! Interactive selection of a capture source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use pipview_capture::{
    CaptureKind, CapturePlatform, CaptureSource, ContentOptions, DisplayInfo, Region,
    ShareableContent, WindowFilter, WindowInfo,
};
use pipview_ipc::{Point, Rect, Size};

use crate::geometry::{selection_rect, window_local_rect, ScreenSpace};
use crate::window_system::{InputEvent, Key, OverlaySurface, SurfaceStyle, WindowSystem};

/// Called once with the picked source and the size of the picked area.
pub type OnSelect = Box<dyn FnOnce(CaptureSource, Size) + Send>;

type ContentSnapshot = Arc<RwLock<Option<ShareableContent>>>;

/// An in-progress region drag.
struct Drag {
    origin: Point,

    /// Screen frame of the window the drag started in.
    window_frame: Rect,
    window: WindowInfo,
}

/// Turns pointer and keyboard input into a capture source.
///
/// A selection starts with [`select`](Self::select) and ends on escape,
/// on completion, or when a region drag starts outside any capturable
/// window. Every ending runs the same cleanup.
pub struct RegionSelector {
    platform: Arc<dyn CapturePlatform>,
    window_system: Arc<dyn WindowSystem>,
    runtime: Handle,
    content: ContentSnapshot,
    selecting: Arc<AtomicBool>,
    kind: CaptureKind,
    on_complete: Option<OnSelect>,
    highlight: Option<Box<dyn OverlaySurface>>,
    overlays: Vec<Box<dyn OverlaySurface>>,
    drag: Option<Drag>,
}

impl RegionSelector {
    /// Create a selector. The content snapshot is loaded in the background
    /// on `runtime`.
    pub fn new(
        platform: Arc<dyn CapturePlatform>,
        window_system: Arc<dyn WindowSystem>,
        runtime: Handle,
    ) -> Self {
        let selector = Self {
            platform,
            window_system,
            runtime,
            content: Arc::new(RwLock::new(None)),
            selecting: Arc::new(AtomicBool::new(false)),
            kind: CaptureKind::Display,
            on_complete: None,
            highlight: None,
            overlays: Vec::new(),
            drag: None,
        };
        selector.refresh_in_background();
        selector
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting.load(Ordering::SeqCst)
    }

    /// The latest content snapshot, if one was loaded.
    pub fn content(&self) -> Option<ShareableContent> {
        self.content.read().clone()
    }

    /// Begin selecting a source of `kind`. A selection already in progress
    /// is cancelled first.
    pub fn select(
        &mut self,
        kind: CaptureKind,
        on_complete: impl FnOnce(CaptureSource, Size) + Send + 'static,
    ) {
        if self.is_selecting() {
            debug!("Cancelling previous selection");
            self.end_selection();
        }

        info!(kind = kind.name(), "Selection started");

        self.kind = kind;
        self.on_complete = Some(Box::new(on_complete));
        self.drag = None;
        self.selecting.store(true, Ordering::SeqCst);
        self.window_system.push_crosshair_cursor();

        if kind == CaptureKind::Region {
            self.overlays = self
                .window_system
                .screens()
                .into_iter()
                .map(|screen| self.window_system.create_surface(SurfaceStyle::Overlay, screen))
                .collect();
        }

        self.highlight = Some(
            self.window_system
                .create_surface(SurfaceStyle::Highlight, Rect::ZERO),
        );

        self.refresh_in_background();
    }

    /// End the current selection without picking anything.
    pub fn cancel(&mut self) {
        if self.is_selecting() {
            info!("Selection cancelled");
            self.end_selection();
        }
    }

    /// Feed one input event. Returns true if the selector consumed it.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        if !self.is_selecting() {
            return false;
        }

        if event == InputEvent::Key(Key::Escape) {
            info!("Selection cancelled");
            self.end_selection();
            return true;
        }
        let Some(location) = event.location() else {
            return true;
        };

        // An active drag is clamped to its window, so it needs no display.
        if self.kind == CaptureKind::Region && self.drag.is_some() {
            match event {
                InputEvent::Drag(p) => self.extend_drag(p),
                InputEvent::DragEnd(p) => self.finish_drag(p),
                _ => {}
            }
            return true;
        }

        let Some(content) = self.content() else {
            trace!("No content snapshot yet, ignoring input");
            return true;
        };
        let Some(space) = ScreenSpace::from_screens(&self.window_system.screens()) else {
            trace!("No screens, ignoring input");
            return true;
        };
        let Some(display) = display_under(&content, &space, location).cloned() else {
            trace!(x = location.x, y = location.y, "Pointer outside every display");
            return true;
        };

        match (self.kind, event) {
            (CaptureKind::Display, InputEvent::PointerMove(_)) => {
                self.move_highlight(space.to_screen_rect(&display.frame));
            }
            (CaptureKind::Window, InputEvent::PointerMove(p)) => {
                if let Some((frame, _)) = self.window_under(&content, &space, p) {
                    self.move_highlight(frame);
                }
            }
            (CaptureKind::Display, InputEvent::Click(_)) => {
                let size = display.frame.size();
                self.complete(CaptureSource::Display(display), size);
                self.end_selection();
            }
            (CaptureKind::Window, InputEvent::Click(p)) => {
                if let Some((_, window)) = self.window_under(&content, &space, p) {
                    let size = window.frame.size();
                    self.complete(CaptureSource::Window(window), size);
                }
                self.end_selection();
            }
            (CaptureKind::Region, InputEvent::Drag(p)) => self.start_drag(&content, &space, p),
            (CaptureKind::Region, InputEvent::DragEnd(p)) => self.finish_drag(p),
            _ => {}
        }

        true
    }

    fn extend_drag(&mut self, pointer: Point) {
        if let Some(drag) = &self.drag {
            let rect = selection_rect(drag.origin, pointer, &drag.window_frame);
            self.move_highlight(rect);
        }
    }

    fn start_drag(&mut self, content: &ShareableContent, space: &ScreenSpace, pointer: Point) {
        match self.window_under(content, space, pointer) {
            Some((window_frame, window)) => {
                debug!(window = window.id.0, "Region drag started");
                self.drag = Some(Drag {
                    origin: pointer,
                    window_frame,
                    window,
                });
            }
            None => {
                info!("Drag started outside a capturable window, cancelling selection");
                self.end_selection();
            }
        }
    }

    fn finish_drag(&mut self, pointer: Point) {
        if let Some(drag) = self.drag.take() {
            let selection = selection_rect(drag.origin, pointer, &drag.window_frame);
            let crop = window_local_rect(&selection, &drag.window_frame);

            if crop.is_empty() {
                info!("Empty region selected, nothing to capture");
            } else {
                match Region::new(drag.window, crop) {
                    Ok(region) => self.complete(CaptureSource::Region(region), selection.size()),
                    Err(e) => warn!("Discarding region selection: {}", e),
                }
            }
        }

        self.end_selection();
    }

    fn complete(&mut self, source: CaptureSource, size: Size) {
        if let Some(on_complete) = self.on_complete.take() {
            info!(
                kind = source.kind().name(),
                width = size.width,
                height = size.height,
                "Selection completed"
            );
            on_complete(source, size);
        }
    }

    /// The frontmost capturable window under `pointer`, with its screen frame.
    ///
    /// Listed windows are matched against the snapshot by exact geometry;
    /// a listed window with no match is skipped.
    fn window_under(
        &self,
        content: &ShareableContent,
        space: &ScreenSpace,
        pointer: Point,
    ) -> Option<(Rect, WindowInfo)> {
        let filter = WindowFilter {
            excluded_bundle_id: self.platform.own_bundle_identifier(),
            on_screen_only: true,
        };
        let candidates = content.capturable_windows(&filter);

        self.window_system
            .window_list()
            .into_iter()
            .filter(|listed| listed.layer == 0)
            .find_map(|listed| {
                let frame = space.to_screen_rect(&listed.bounds);
                if !frame.contains(pointer) {
                    return None;
                }

                candidates
                    .iter()
                    .find(|window| {
                        window.frame == listed.bounds
                            && window
                                .owning_application
                                .as_ref()
                                .map_or(true, |app| app.process_id == listed.owner_pid)
                    })
                    .map(|window| (frame, window.clone()))
            })
    }

    fn move_highlight(&mut self, frame: Rect) {
        if let Some(highlight) = self.highlight.as_mut() {
            highlight.set_frame(frame);
        }
    }

    /// Shared cleanup for every way a selection ends.
    fn end_selection(&mut self) {
        if !self.selecting.swap(false, Ordering::SeqCst) {
            return;
        }

        self.window_system.pop_cursor();

        if let Some(mut highlight) = self.highlight.take() {
            highlight.close();
        }
        for mut overlay in self.overlays.drain(..) {
            overlay.close();
        }

        self.drag = None;
        self.on_complete = None;
    }

    /// Reload the content snapshot and wait for it.
    pub async fn refresh(&self) {
        refresh_content(Arc::clone(&self.platform), Arc::clone(&self.content)).await;
    }

    fn refresh_in_background(&self) {
        self.runtime.spawn(refresh_content(
            Arc::clone(&self.platform),
            Arc::clone(&self.content),
        ));
    }

    /// Keep the snapshot fresh while no selection is in progress.
    pub fn spawn_idle_refresh(&self, period: Duration) -> JoinHandle<()> {
        let platform = Arc::clone(&self.platform);
        let content = Arc::clone(&self.content);
        let selecting = Arc::clone(&self.selecting);

        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !selecting.load(Ordering::SeqCst) {
                    refresh_content(Arc::clone(&platform), Arc::clone(&content)).await;
                }
            }
        })
    }
}

impl Drop for RegionSelector {
    fn drop(&mut self) {
        self.end_selection();
    }
}

async fn refresh_content(platform: Arc<dyn CapturePlatform>, content: ContentSnapshot) {
    let options = ContentOptions {
        exclude_desktop_windows: true,
        on_screen_windows_only: false,
    };

    match platform.shareable_content(options).await {
        Ok(fresh) => {
            trace!(
                displays = fresh.displays.len(),
                windows = fresh.windows.len(),
                "Content snapshot refreshed"
            );
            *content.write() = Some(fresh);
        }
        Err(e) => warn!("Failed to refresh capturable content: {}", e),
    }
}

/// The display whose frame contains `pointer` (screen coordinates).
fn display_under<'a>(
    content: &'a ShareableContent,
    space: &ScreenSpace,
    pointer: Point,
) -> Option<&'a DisplayInfo> {
    let location = space.to_capture_point(pointer);
    content
        .displays
        .iter()
        .find(|display| display.frame.contains(location))
}
