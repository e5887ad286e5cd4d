//! In-memory collaborators for session and registry tests.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use pipview_audio::{AudioBuffer, ChannelLayout, Samples};
use pipview_capture::{
    CaptureError, CapturePlatform, CaptureResult, CapturedFrame, ContentFilter, ContentOptions,
    DisplayId, DisplayInfo, FrameStatus, PixelFormat, PixelImage, PlatformStream,
    RunningApplication, ShareableContent, StreamConfiguration, StreamOutput, VideoSample, WindowId,
    WindowInfo,
};
use pipview_ipc::{Rect, SessionEvent, Size};

use crate::session::PresentationSurface;

/// Platform whose content and failures are set by the test.
pub(crate) struct FakePlatform {
    content: Mutex<Option<ShareableContent>>,
    outputs: Mutex<Vec<StreamOutput>>,
    opened_filters: Mutex<Vec<ContentFilter>>,
    filter_updates: Arc<Mutex<Vec<ContentFilter>>>,
    open_streams: Arc<AtomicUsize>,
    fail_next_open: AtomicBool,
    fail_stop: Arc<AtomicBool>,
    fail_reconfigure: Arc<AtomicBool>,
}

impl FakePlatform {
    /// `None` content makes enumeration fail.
    pub(crate) fn new(content: Option<ShareableContent>) -> Self {
        Self {
            content: Mutex::new(content),
            outputs: Mutex::new(Vec::new()),
            opened_filters: Mutex::new(Vec::new()),
            filter_updates: Arc::new(Mutex::new(Vec::new())),
            open_streams: Arc::new(AtomicUsize::new(0)),
            fail_next_open: AtomicBool::new(false),
            fail_stop: Arc::new(AtomicBool::new(false)),
            fail_reconfigure: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn set_content(&self, content: Option<ShareableContent>) {
        *self.content.lock() = content;
    }

    pub(crate) fn fail_next_open(&self) {
        self.fail_next_open.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_reconfigure(&self) {
        self.fail_reconfigure.store(true, Ordering::SeqCst);
    }

    /// Number of streams ever opened.
    pub(crate) fn open_count(&self) -> usize {
        self.opened_filters.lock().len()
    }

    /// Number of streams opened and not yet stopped.
    pub(crate) fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub(crate) fn last_filter(&self) -> Option<ContentFilter> {
        self.opened_filters.lock().last().cloned()
    }

    pub(crate) fn filter_updates(&self) -> Vec<ContentFilter> {
        self.filter_updates.lock().clone()
    }

    pub(crate) fn last_output(&self) -> Option<StreamOutput> {
        self.outputs.lock().last().cloned()
    }

    /// Drop every output so the event sequences end.
    pub(crate) fn drop_outputs(&self) {
        self.outputs.lock().clear();
    }
}

#[async_trait]
impl CapturePlatform for FakePlatform {
    async fn shareable_content(&self, _options: ContentOptions) -> CaptureResult<ShareableContent> {
        self.content
            .lock()
            .clone()
            .ok_or(CaptureError::PermissionDenied)
    }

    fn own_bundle_identifier(&self) -> Option<String> {
        Some("com.example.pipview".to_string())
    }

    async fn open_stream(
        &self,
        filter: &ContentFilter,
        _configuration: &StreamConfiguration,
        output: StreamOutput,
    ) -> CaptureResult<Box<dyn PlatformStream>> {
        if self.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::StreamOpen("no capture service".to_string()));
        }

        self.opened_filters.lock().push(filter.clone());
        self.outputs.lock().push(output);
        self.open_streams.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FakeStream {
            open_streams: Arc::clone(&self.open_streams),
            filter_updates: Arc::clone(&self.filter_updates),
            fail_stop: Arc::clone(&self.fail_stop),
            fail_reconfigure: Arc::clone(&self.fail_reconfigure),
        }))
    }
}

struct FakeStream {
    open_streams: Arc<AtomicUsize>,
    filter_updates: Arc<Mutex<Vec<ContentFilter>>>,
    fail_stop: Arc<AtomicBool>,
    fail_reconfigure: Arc<AtomicBool>,
}

#[async_trait]
impl PlatformStream for FakeStream {
    async fn update_configuration(&mut self, _configuration: &StreamConfiguration) -> CaptureResult<()> {
        if self.fail_reconfigure.load(Ordering::SeqCst) {
            return Err(CaptureError::Reconfigure("configuration rejected".to_string()));
        }
        Ok(())
    }

    async fn update_content_filter(&mut self, filter: &ContentFilter) -> CaptureResult<()> {
        self.filter_updates.lock().push(filter.clone());
        Ok(())
    }

    async fn stop_capture(&mut self) -> CaptureResult<()> {
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(CaptureError::StreamStop("stream busy".to_string()));
        }
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Surface remembering the size of every frame it was given.
#[derive(Default)]
pub(crate) struct RecordingSurface {
    sizes: Mutex<Vec<Size>>,
}

impl RecordingSurface {
    pub(crate) fn frame_count(&self) -> usize {
        self.sizes.lock().len()
    }

    pub(crate) fn last_size(&self) -> Option<Size> {
        self.sizes.lock().last().copied()
    }
}

impl PresentationSurface for RecordingSurface {
    fn update_frame(&self, frame: &CapturedFrame) {
        self.sizes.lock().push(frame.size());
    }
}

pub(crate) fn display(id: u32, width: f64, height: f64) -> DisplayInfo {
    DisplayInfo {
        id: DisplayId(id),
        frame: Rect::new(0.0, 0.0, width, height),
        width: width as u32,
        height: height as u32,
    }
}

pub(crate) fn window(id: u32, app: &str, width: f64, height: f64) -> WindowInfo {
    WindowInfo {
        id: WindowId(id),
        title: Some(format!("{app} window")),
        frame: Rect::new(100.0, 100.0, width, height),
        owning_application: Some(RunningApplication {
            name: app.to_string(),
            bundle_identifier: format!("com.example.{}", app.to_lowercase()),
            process_id: id as i32,
        }),
        is_on_screen: true,
    }
}

/// A complete BGRA sample of the given size.
pub(crate) fn sample(width: u32, height: u32) -> VideoSample {
    let data = Bytes::from(vec![0x40u8; (width * height * 4) as usize]);
    let image = PixelImage::packed(data, width, height, PixelFormat::Bgra8).unwrap();
    VideoSample {
        status: Some(FrameStatus::Complete),
        content_rect: Some(Rect::from_size(image.size())),
        image: Some(image),
        content_scale: Some(1.0),
        scale_factor: Some(2.0),
    }
}

pub(crate) fn loud_audio() -> AudioBuffer {
    AudioBuffer::new(
        Samples::Float32(vec![0.0, 0.5, 0.0, -0.5]),
        2,
        ChannelLayout::Interleaved,
    )
    .unwrap()
}

pub(crate) fn drain_events(events: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
    events.try_iter().collect()
}

/// Yield to other tasks until `done` holds.
pub(crate) async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Await `future`, failing the test if it takes more than ten seconds.
pub(crate) async fn within<F: Future>(future: F) -> F::Output {
    match tokio::time::timeout(Duration::from_secs(10), future).await {
        Ok(output) => output,
        Err(_) => panic!("timed out"),
    }
}
