//! A single capture session.
//!
//! Each session is owned by one task. The [`CaptureSession`] handle sends
//! it commands, platform delivery threads send it stream messages, and the
//! task is the only writer of the session's status. The presentation layer
//! reads the status through a watch channel and receives changes as
//! [`SessionEvent`]s.

use std::future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace, warn};

use pipview_capture::{
    CapturePlatform, CaptureSource, CaptureTarget, CapturedFrame, ContentOptions, CropHandle,
    Frame, PlatformStream, StreamMessage, StreamOutput, StreamPlan, WindowFilter,
};
use pipview_ipc::{
    PreviewSettings, SessionEvent, SessionId, SessionState, SessionStatus, Size, StopReason,
};

use crate::error::SessionError;
use crate::SessionResult;

/// How often an unset source is resolved again.
pub const SOURCE_REFRESH_INTERVAL: Duration = Duration::from_secs(3);

/// Settings shared between their owner and every session.
pub type SharedSettings = Arc<RwLock<PreviewSettings>>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Sink for the frames of one session.
pub trait PresentationSurface: Send + Sync {
    /// Show a new frame. Called from the session's task.
    fn update_frame(&self, frame: &CapturedFrame);
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    pub platform: Arc<dyn CapturePlatform>,
    pub event_tx: Sender<SessionEvent>,
    pub settings: SharedSettings,
}

enum Command {
    Start {
        reply: oneshot::Sender<SessionResult<()>>,
    },
    Stop {
        close: bool,
        reply: oneshot::Sender<SessionResult<()>>,
    },
    SetSource(CaptureSource),
}

/// Handle to a capture session.
///
/// Dropping the last handle stops the session's stream and ends its task.
pub struct CaptureSession {
    id: SessionId,
    command_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<SessionStatus>,
}

impl CaptureSession {
    /// Create a session and spawn its task on the current Tokio runtime.
    ///
    /// Nothing is captured until [`start`](Self::start) is called.
    pub fn spawn(
        target: CaptureTarget,
        surface: Arc<dyn PresentationSurface>,
        context: SessionContext,
    ) -> Self {
        let id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let (status_tx, status_rx) = watch::channel(SessionStatus {
            source: target.source().map(CaptureSource::to_source_info),
            ..Default::default()
        });

        let actor = SessionActor {
            id,
            context,
            surface,
            target,
            status_tx,
            is_set_up: false,
            start_requested: false,
            stream: None,
            refresh: None,
            last_frame_at: Instant::now(),
        };
        tokio::spawn(actor.run(command_rx));

        debug!(session = %id, "Session created");

        Self {
            id,
            command_tx,
            status_rx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current status snapshot.
    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    pub fn state(&self) -> SessionState {
        self.status_rx.borrow().state
    }

    /// True while the session holds a stream or can resume one.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    pub fn content_size(&self) -> Size {
        self.status_rx.borrow().content_size
    }

    pub fn is_inactive(&self) -> bool {
        self.status_rx.borrow().is_inactive
    }

    pub fn is_playing_audio(&self) -> bool {
        self.status_rx.borrow().is_playing_audio
    }

    /// Start capturing, or resume a paused session.
    ///
    /// An unset source is resolved to the first available display or
    /// window. If nothing is available yet, the session keeps looking and
    /// opens its stream once a source turns up.
    pub async fn start(&self) -> SessionResult<()> {
        let (reply, rx) = oneshot::channel();
        if self.command_tx.send(Command::Start { reply }).is_err() {
            return Err(SessionError::Closed);
        }
        rx.await.unwrap_or(Err(SessionError::Closed))
    }

    /// Stop capturing.
    ///
    /// With `close` the session is torn down for good; otherwise it is
    /// paused and can be resumed with [`start`](Self::start).
    pub async fn stop(&self, close: bool) -> SessionResult<()> {
        let (reply, rx) = oneshot::channel();
        if self.command_tx.send(Command::Stop { close, reply }).is_err() {
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    /// Replace the captured source. A running stream is reconfigured in
    /// place.
    pub fn set_source(&self, source: CaptureSource) -> SessionResult<()> {
        self.command_tx
            .send(Command::SetSource(source))
            .map_err(|_| SessionError::Closed)
    }

    /// Wait until the session has stopped for good.
    pub async fn stopped(&self) {
        let mut status_rx = self.status_rx.clone();
        let _ = status_rx.wait_for(|status| status.state.is_terminal()).await;
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

struct ActiveStream {
    stream: Box<dyn PlatformStream>,
    messages: mpsc::UnboundedReceiver<StreamMessage>,
    crop: CropHandle,
}

enum Step {
    Command(Option<Command>),
    Message(Option<StreamMessage>),
    Refresh,
}

struct SessionActor {
    id: SessionId,
    context: SessionContext,
    surface: Arc<dyn PresentationSurface>,
    target: CaptureTarget,
    status_tx: watch::Sender<SessionStatus>,
    is_set_up: bool,
    start_requested: bool,
    stream: Option<ActiveStream>,
    refresh: Option<Interval>,
    last_frame_at: Instant,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let step = tokio::select! {
                biased;
                command = commands.recv() => Step::Command(command),
                message = next_message(&mut self.stream) => Step::Message(message),
                _ = next_refresh(&mut self.refresh) => Step::Refresh,
            };

            match step {
                Step::Command(Some(command)) => self.handle_command(command).await,
                Step::Command(None) => {
                    debug!(session = %self.id, "Session handle dropped");
                    let _ = self.stop(true).await;
                }
                Step::Message(message) => self.handle_message(message),
                Step::Refresh => self.refresh_source().await,
            }

            if self.state().is_terminal() {
                break;
            }
        }

        debug!(session = %self.id, "Session task finished");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = self.start().await;
                let _ = reply.send(result);
            }
            Command::Stop { close, reply } => {
                let result = self.stop(close).await;
                let _ = reply.send(result);
            }
            Command::SetSource(source) => self.set_source(source).await,
        }
    }

    #[instrument(name = "session_start", skip(self), fields(session = %self.id))]
    async fn start(&mut self) -> SessionResult<()> {
        match self.state() {
            SessionState::Stopped => return Err(SessionError::Closed),
            SessionState::Running => {
                debug!("Already running, ignoring start");
                return Ok(());
            }
            SessionState::NotSetUp | SessionState::Paused => {}
        }

        if !self.is_set_up {
            self.set_up().await;
        }

        let Some(source) = self.target.source().cloned() else {
            info!(
                "No {} available yet, waiting for one",
                self.target.kind().name()
            );
            self.start_requested = true;
            return Ok(());
        };

        self.open(&source).await
    }

    /// Resolve an unset source and keep refreshing it while it stays unset.
    async fn set_up(&mut self) {
        if !self.target.is_resolved() {
            self.resolve_default().await;
        }

        if !self.target.is_resolved() {
            let mut refresh = interval_at(
                Instant::now() + SOURCE_REFRESH_INTERVAL,
                SOURCE_REFRESH_INTERVAL,
            );
            refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.refresh = Some(refresh);
        }

        self.is_set_up = true;
    }

    async fn resolve_default(&mut self) {
        let kind = self.target.kind();
        let options = ContentOptions {
            exclude_desktop_windows: false,
            on_screen_windows_only: false,
        };

        let content = match self.context.platform.shareable_content(options).await {
            Ok(content) => content,
            Err(e) => {
                warn!(session = %self.id, "Failed to enumerate capturable content: {}", e);
                return;
            }
        };

        let filter = WindowFilter {
            excluded_bundle_id: self.context.platform.own_bundle_identifier(),
            on_screen_only: false,
        };

        match CaptureSource::first_available(kind, &content, &filter) {
            Some(source) => {
                info!(session = %self.id, kind = kind.name(), "Resolved default source");
                self.assign(source);
            }
            None => debug!(session = %self.id, kind = kind.name(), "No source available"),
        }
    }

    async fn refresh_source(&mut self) {
        if self.target.is_resolved() {
            self.refresh = None;
            return;
        }

        trace!(session = %self.id, "Refreshing default source");
        self.resolve_default().await;

        if let Some(source) = self.target.source().cloned() {
            if self.start_requested {
                self.start_requested = false;
                let _ = self.open(&source).await;
            }
        }
    }

    /// Open the platform stream for `source` and mark the session running.
    async fn open(&mut self, source: &CaptureSource) -> SessionResult<()> {
        let plan = StreamPlan::derive(source, &self.context.settings.read());
        let (output, messages) = StreamOutput::channel(plan.crop);
        let crop = output.crop_handle();

        let result = self
            .context
            .platform
            .open_stream(&plan.filter, &plan.configuration, output)
            .await;

        match result {
            Ok(stream) => {
                self.stream = Some(ActiveStream {
                    stream,
                    messages,
                    crop,
                });
                self.last_frame_at = Instant::now();
                self.set_inactive(false);
                self.transition_to(SessionState::Running);

                info!(
                    session = %self.id,
                    width = plan.configuration.width,
                    height = plan.configuration.height,
                    "Capture stream opened"
                );
                Ok(())
            }
            Err(e) => {
                error!(session = %self.id, "Failed to open capture stream: {}", e);
                self.finish(StopReason::OpenFailed {
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    #[instrument(name = "session_stop", skip(self), fields(session = %self.id))]
    async fn stop(&mut self, close: bool) -> SessionResult<()> {
        self.start_requested = false;

        match self.state() {
            SessionState::Running => {}
            SessionState::Paused => {
                if close {
                    self.finish(StopReason::Closed);
                }
                return Ok(());
            }
            SessionState::NotSetUp => {
                if close {
                    self.retire();
                }
                return Ok(());
            }
            SessionState::Stopped => return Ok(()),
        }

        if let Some(mut active) = self.stream.take() {
            if let Err(e) = active.stream.stop_capture().await {
                error!("Failed to stop capture stream: {}", e);
                self.finish(StopReason::StreamFailed {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        }

        if close {
            info!("Session closed");
            self.finish(StopReason::Closed);
        } else {
            info!("Session paused");
            self.transition_to(SessionState::Paused);
        }

        Ok(())
    }

    async fn set_source(&mut self, source: CaptureSource) {
        if self.state().is_terminal() {
            debug!(session = %self.id, "Ignoring source change on a closed session");
            return;
        }

        self.assign(source.clone());

        if self.state() == SessionState::Running {
            self.reconfigure(&source).await;
        } else if self.start_requested {
            self.start_requested = false;
            let _ = self.open(&source).await;
        }
    }

    /// Push a new plan to the open stream. On failure the stream keeps its
    /// previous configuration.
    async fn reconfigure(&mut self, source: &CaptureSource) {
        let plan = StreamPlan::derive(source, &self.context.settings.read());
        let Some(active) = self.stream.as_mut() else {
            return;
        };

        let result = match active.stream.update_configuration(&plan.configuration).await {
            Ok(()) => active.stream.update_content_filter(&plan.filter).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                active.crop.set(plan.crop);
                info!(session = %self.id, "Capture stream reconfigured");
            }
            Err(e) => warn!(session = %self.id, "Failed to reconfigure capture stream: {}", e),
        }
    }

    fn handle_message(&mut self, message: Option<StreamMessage>) {
        match message {
            Some(StreamMessage::Frame(Frame::Captured(frame))) => self.on_frame(&frame),
            Some(StreamMessage::Frame(Frame::Idle)) => self.on_idle(),
            Some(StreamMessage::AudioActivity { playing }) => self.set_playing_audio(playing),
            Some(StreamMessage::Failed(e)) => {
                error!(session = %self.id, "Capture stream failed: {}", e);
                self.finish(StopReason::StreamFailed {
                    message: e.to_string(),
                });
            }
            None => {
                warn!(session = %self.id, "Capture stream ended unexpectedly");
                self.finish(StopReason::StreamEnded);
            }
        }
    }

    fn on_frame(&mut self, frame: &CapturedFrame) {
        self.surface.update_frame(frame);
        self.set_inactive(false);
        self.last_frame_at = Instant::now();

        let size = frame.size();
        if self.status_tx.borrow().content_size != size {
            self.status_tx.send_modify(|status| status.content_size = size);
            self.send_event(SessionEvent::ContentSizeChanged { id: self.id, size });
        }
    }

    fn on_idle(&mut self) {
        let threshold = self.context.settings.read().inactivity_threshold();
        if self.last_frame_at.elapsed() > threshold {
            self.set_inactive(true);
        }
    }

    fn set_inactive(&mut self, inactive: bool) {
        if self.status_tx.borrow().is_inactive == inactive {
            return;
        }

        debug!(session = %self.id, inactive, "Inactivity changed");
        self.status_tx.send_modify(|status| status.is_inactive = inactive);
        self.send_event(SessionEvent::InactivityChanged {
            id: self.id,
            inactive,
        });
    }

    fn set_playing_audio(&mut self, playing: bool) {
        if self.status_tx.borrow().is_playing_audio == playing {
            return;
        }

        self.status_tx.send_modify(|status| status.is_playing_audio = playing);
        self.send_event(SessionEvent::AudioActivityChanged {
            id: self.id,
            playing,
        });
    }

    fn assign(&mut self, source: CaptureSource) {
        let info = source.to_source_info();
        self.target = CaptureTarget::Resolved(source);
        self.refresh = None;

        self.status_tx.send_modify(|status| status.source = Some(info.clone()));
        self.send_event(SessionEvent::SourceChanged {
            id: self.id,
            source: info,
        });
    }

    /// Terminal transition. Sends the stopped notification.
    fn finish(&mut self, reason: StopReason) {
        self.stream = None;
        self.refresh = None;
        self.start_requested = false;

        self.transition_to(SessionState::Stopped);
        self.send_event(SessionEvent::Stopped {
            id: self.id,
            reason,
        });
    }

    /// Terminal transition for a session that never started. Nothing is
    /// sent; the status still turns terminal.
    fn retire(&mut self) {
        self.refresh = None;
        debug!(session = %self.id, "Retiring session that never started");
        self.status_tx
            .send_modify(|status| status.state = SessionState::Stopped);
    }

    fn state(&self) -> SessionState {
        self.status_tx.borrow().state
    }

    fn transition_to(&mut self, new_state: SessionState) {
        let previous = self.state();
        if previous == new_state {
            return;
        }

        self.status_tx.send_modify(|status| status.state = new_state);

        debug!(
            session = %self.id,
            previous = %previous.name(),
            current = %new_state.name(),
            "State transition"
        );

        self.send_event(SessionEvent::StateChanged {
            id: self.id,
            previous,
            current: new_state,
        });
    }

    fn send_event(&self, event: SessionEvent) {
        if let Err(e) = self.context.event_tx.try_send(event) {
            warn!("Failed to send event: {}", e);
        }
    }
}

impl Drop for SessionActor {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!(session = %self.id, "Session task dropped with an open stream");
        }
    }
}

async fn next_message(stream: &mut Option<ActiveStream>) -> Option<StreamMessage> {
    match stream {
        Some(active) => active.messages.recv().await,
        None => future::pending().await,
    }
}

async fn next_refresh(refresh: &mut Option<Interval>) {
    match refresh {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        display, drain_events, loud_audio, sample, settle, window, within, FakePlatform,
        RecordingSurface,
    };
    use pipview_capture::{
        CaptureError, CaptureKind, ContentFilter, DisplayId, FrameStatus, Region,
        ShareableContent, VideoSample, WindowId,
    };
    use pipview_ipc::{event_channel, Rect};

    struct Fixture {
        platform: Arc<FakePlatform>,
        surface: Arc<RecordingSurface>,
        events: crossbeam_channel::Receiver<SessionEvent>,
        session: CaptureSession,
    }

    fn fixture(target: CaptureTarget, content: Option<ShareableContent>) -> Fixture {
        let platform = Arc::new(FakePlatform::new(content));
        let surface = Arc::new(RecordingSurface::default());
        let (event_tx, events) = event_channel();
        let context = SessionContext {
            platform: platform.clone(),
            event_tx,
            settings: Arc::new(RwLock::new(PreviewSettings::default())),
        };
        let session = CaptureSession::spawn(target, surface.clone(), context);

        Fixture {
            platform,
            surface,
            events,
            session,
        }
    }

    fn one_display() -> ShareableContent {
        ShareableContent {
            displays: vec![display(1, 1920.0, 1080.0)],
            windows: vec![window(10, "Editor", 640.0, 480.0)],
        }
    }

    fn stopped_reasons(events: &[SessionEvent]) -> Vec<StopReason> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Stopped { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_start_resolves_first_display() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));

        f.session.start().await.unwrap();

        assert_eq!(f.session.state(), SessionState::Running);
        assert_eq!(f.platform.open_count(), 1);
        assert_eq!(
            f.platform.last_filter(),
            Some(ContentFilter::Display {
                display: DisplayId(1),
                excluded_windows: Vec::new()
            })
        );
        assert_eq!(f.session.status().source.map(|s| s.id), Some("display:1".to_string()));
    }

    #[tokio::test]
    async fn test_start_twice_is_a_no_op() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));

        f.session.start().await.unwrap();
        f.session.start().await.unwrap();

        assert_eq!(f.platform.open_count(), 1);
    }

    #[tokio::test]
    async fn test_frames_reach_surface_and_update_content_size() {
        let f = fixture(CaptureTarget::Unset(CaptureKind::Window), Some(one_display()));
        f.session.start().await.unwrap();

        let output = f.platform.last_output().unwrap();
        output.did_output_video(sample(16, 8));
        output.did_output_video(sample(16, 8));
        output.did_output_video(sample(32, 8));
        settle(|| f.surface.frame_count() == 3).await;

        assert_eq!(f.session.content_size(), Size::new(32.0, 8.0));
        let size_changes = drain_events(&f.events)
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::ContentSizeChanged { .. }))
            .count();
        assert_eq!(size_changes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_follows_frames_and_idle_ticks() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();
        let output = f.platform.last_output().unwrap();

        // Frames arriving within the threshold never mark the session inactive.
        for n in 1..=4 {
            tokio::time::advance(Duration::from_secs(45)).await;
            output.did_output_video(sample(4, 4));
            settle(|| f.surface.frame_count() == n).await;
            assert!(!f.session.is_inactive());
        }

        tokio::time::advance(Duration::from_secs(61)).await;
        output.did_output_video(VideoSample {
            status: Some(FrameStatus::Idle),
            ..Default::default()
        });
        let mut status = f.session.subscribe();
        within(status.wait_for(|s| s.is_inactive)).await.unwrap();

        output.did_output_video(sample(4, 4));
        within(status.wait_for(|s| !s.is_inactive)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_within_threshold_stays_active() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();
        let output = f.platform.last_output().unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        output.did_output_video(VideoSample {
            status: Some(FrameStatus::Idle),
            ..Default::default()
        });
        output.did_output_video(sample(4, 4));
        settle(|| f.surface.frame_count() == 1).await;

        assert!(!f.session.is_inactive());
    }

    #[tokio::test]
    async fn test_pause_and_resume_use_same_source() {
        let f = fixture(CaptureTarget::Unset(CaptureKind::Window), Some(one_display()));
        f.session.start().await.unwrap();

        f.session.stop(false).await.unwrap();
        assert_eq!(f.session.state(), SessionState::Paused);
        assert!(f.session.is_running());
        assert_eq!(f.platform.open_streams(), 0);

        f.session.start().await.unwrap();
        assert_eq!(f.session.state(), SessionState::Running);
        assert_eq!(f.platform.open_count(), 2);
        assert_eq!(f.platform.last_filter(), Some(ContentFilter::Window(WindowId(10))));

        f.platform.last_output().unwrap().did_output_video(sample(4, 4));
        settle(|| f.surface.frame_count() == 1).await;
        assert!(stopped_reasons(&drain_events(&f.events)).is_empty());
    }

    #[tokio::test]
    async fn test_close_sends_exactly_one_stopped_event() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();

        f.session.stop(true).await.unwrap();
        f.session.stop(true).await.unwrap();
        f.session.stop(false).await.unwrap();

        assert_eq!(f.session.state(), SessionState::Stopped);
        assert!(!f.session.is_running());
        assert_eq!(f.platform.open_streams(), 0);
        assert!(matches!(f.session.start().await, Err(SessionError::Closed)));
        assert_eq!(stopped_reasons(&drain_events(&f.events)), vec![StopReason::Closed]);
    }

    #[tokio::test]
    async fn test_close_while_paused_notifies() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();
        f.session.stop(false).await.unwrap();

        f.session.stop(true).await.unwrap();

        assert_eq!(f.session.state(), SessionState::Stopped);
        assert_eq!(stopped_reasons(&drain_events(&f.events)), vec![StopReason::Closed]);
    }

    #[tokio::test]
    async fn test_close_before_start_retires_silently() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));

        f.session.stop(true).await.unwrap();

        assert_eq!(f.session.state(), SessionState::Stopped);
        assert!(matches!(f.session.start().await, Err(SessionError::Closed)));
        assert_eq!(f.platform.open_count(), 0);
        assert!(drain_events(&f.events).is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_stops_session() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.platform.fail_next_open();

        let result = f.session.start().await;

        assert!(matches!(result, Err(SessionError::Capture(CaptureError::StreamOpen(_)))));
        assert_eq!(f.session.state(), SessionState::Stopped);
        let reasons = stopped_reasons(&drain_events(&f.events));
        assert!(matches!(reasons.as_slice(), [StopReason::OpenFailed { .. }]));
    }

    #[tokio::test]
    async fn test_stream_failure_stops_session() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();

        f.platform
            .last_output()
            .unwrap()
            .did_stop_with_error(CaptureError::StreamRuntime("display removed".to_string()));
        within(f.session.stopped()).await;

        let reasons = stopped_reasons(&drain_events(&f.events));
        assert!(matches!(reasons.as_slice(), [StopReason::StreamFailed { .. }]));
    }

    #[tokio::test]
    async fn test_stream_end_stops_session() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();

        f.platform.drop_outputs();
        within(f.session.stopped()).await;

        assert_eq!(
            stopped_reasons(&drain_events(&f.events)),
            vec![StopReason::StreamEnded]
        );
    }

    #[tokio::test]
    async fn test_stop_failure_ends_session() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();
        f.platform.fail_stop();

        let result = f.session.stop(false).await;

        assert!(result.is_err());
        assert_eq!(f.session.state(), SessionState::Stopped);
        let reasons = stopped_reasons(&drain_events(&f.events));
        assert!(matches!(reasons.as_slice(), [StopReason::StreamFailed { .. }]));
    }

    #[tokio::test]
    async fn test_set_source_reconfigures_running_stream() {
        let f = fixture(CaptureTarget::Unset(CaptureKind::Window), Some(one_display()));
        f.session.start().await.unwrap();

        let target = window(20, "Browser", 40.0, 30.0);
        let crop = Rect::new(10.0, 5.0, 20.0, 10.0);
        let region = Region::new(target, crop).unwrap();
        f.session.set_source(CaptureSource::Region(region)).unwrap();
        // Commands are handled in order.
        f.session.start().await.unwrap();

        assert_eq!(f.platform.open_count(), 1);
        assert_eq!(f.platform.filter_updates(), vec![ContentFilter::Window(WindowId(20))]);

        f.platform.last_output().unwrap().did_output_video(sample(40, 30));
        settle(|| f.surface.frame_count() == 1).await;
        assert_eq!(f.surface.last_size(), Some(Size::new(20.0, 10.0)));
        assert_eq!(f.session.status().source.map(|s| s.width), Some(20));
    }

    #[tokio::test]
    async fn test_failed_reconfigure_keeps_running() {
        let f = fixture(CaptureTarget::Unset(CaptureKind::Window), Some(one_display()));
        f.session.start().await.unwrap();
        f.platform.fail_reconfigure();

        let region = Region::new(
            window(20, "Browser", 40.0, 30.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        )
        .unwrap();
        f.session.set_source(CaptureSource::Region(region)).unwrap();
        f.session.start().await.unwrap();

        assert_eq!(f.session.state(), SessionState::Running);
        f.platform.last_output().unwrap().did_output_video(sample(16, 16));
        settle(|| f.surface.frame_count() == 1).await;
        assert_eq!(f.surface.last_size(), Some(Size::new(16.0, 16.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_start_opens_after_refresh() {
        let f = fixture(CaptureTarget::default(), None);

        f.session.start().await.unwrap();
        assert_eq!(f.session.state(), SessionState::NotSetUp);
        assert_eq!(f.platform.open_count(), 0);

        f.platform.set_content(Some(one_display()));
        let mut status = f.session.subscribe();
        within(status.wait_for(|s| s.state == SessionState::Running)).await.unwrap();

        assert_eq!(f.platform.open_count(), 1);
    }

    #[tokio::test]
    async fn test_set_source_completes_pending_start() {
        let f = fixture(CaptureTarget::Unset(CaptureKind::Window), Some(ShareableContent::default()));
        f.session.start().await.unwrap();
        assert_eq!(f.platform.open_count(), 0);

        let source = CaptureSource::Window(window(30, "Mail", 300.0, 200.0));
        f.session.set_source(source).unwrap();
        f.session.start().await.unwrap();

        assert_eq!(f.session.state(), SessionState::Running);
        assert_eq!(f.platform.open_count(), 1);
    }

    #[tokio::test]
    async fn test_audio_activity_updates_status() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();

        f.platform.last_output().unwrap().did_output_audio(&loud_audio());
        let mut status = f.session.subscribe();
        within(status.wait_for(|s| s.is_playing_audio)).await.unwrap();

        assert!(!f.session.is_inactive());
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_stream() {
        let f = fixture(CaptureTarget::default(), Some(one_display()));
        f.session.start().await.unwrap();
        assert_eq!(f.platform.open_streams(), 1);

        drop(f.session);
        settle(|| f.platform.open_streams() == 0).await;

        assert_eq!(stopped_reasons(&drain_events(&f.events)), vec![StopReason::Closed]);
    }
}
