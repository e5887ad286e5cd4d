//! Shared value types for pipview.
//!
//! This crate defines the geometry, settings, session state and event
//! types exchanged between the capture core and the presentation layer.

mod events;
mod settings;
mod state;
mod types;

pub use events::{SessionEvent, SessionId};
pub use settings::{
    Corner, PreviewSettings, SettingsError, MAX_INACTIVITY_THRESHOLD_SECS, MAX_REFRESH_FREQUENCY,
    MIN_INACTIVITY_THRESHOLD_SECS, MIN_REFRESH_FREQUENCY,
};
pub use state::{SessionState, SessionStatus, StopReason};
pub use types::{CaptureSourceInfo, CaptureSourceType, Point, Rect, Size};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for events (sessions → UI).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
