//! Producer side of a session's event sequence.
//!
//! Platform streams deliver samples on their own threads. [`StreamOutput`]
//! converts them on the spot (decode, crop, silence check) and forwards the
//! results over an unbounded channel to the task that owns the session.

use std::sync::Arc;

use parking_lot::RwLock;
use pipview_audio::{is_silent, AudioBuffer};
use pipview_ipc::Rect;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::CaptureError;
use crate::frame::{Frame, VideoSample};

/// One message from a platform stream to its session.
#[derive(Debug)]
pub enum StreamMessage {
    /// A decoded frame or an idle heartbeat.
    Frame(Frame),

    /// Verdict on the latest audio packet.
    AudioActivity { playing: bool },

    /// Delivery failed. No further messages follow.
    Failed(CaptureError),
}

/// Sample callback handed to a platform stream.
#[derive(Debug, Clone)]
pub struct StreamOutput {
    tx: mpsc::UnboundedSender<StreamMessage>,
    crop: Arc<RwLock<Option<Rect>>>,
}

impl StreamOutput {
    /// Create an output and the receiving end of its event sequence.
    ///
    /// The sequence ends once every clone of the output is dropped.
    pub fn channel(crop: Option<Rect>) -> (Self, mpsc::UnboundedReceiver<StreamMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let output = Self {
            tx,
            crop: Arc::new(RwLock::new(crop)),
        };
        (output, rx)
    }

    /// Handle for changing the crop of a running stream.
    pub fn crop_handle(&self) -> CropHandle {
        CropHandle {
            crop: Arc::clone(&self.crop),
        }
    }

    /// Called by the platform for every video sample.
    pub fn did_output_video(&self, sample: VideoSample) {
        let crop = *self.crop.read();

        match Frame::from_sample(sample, crop.as_ref()) {
            Ok(Some(frame)) => self.send(StreamMessage::Frame(frame)),
            Ok(None) => trace!("Skipping sample without content"),
            Err(e) => trace!("Dropping video sample: {}", e),
        }
    }

    /// Called by the platform for every audio packet.
    pub fn did_output_audio(&self, buffer: &AudioBuffer) {
        self.send(StreamMessage::AudioActivity {
            playing: !is_silent(buffer),
        });
    }

    /// Called by the platform when the stream stops on its own.
    pub fn did_stop_with_error(&self, error: CaptureError) {
        self.send(StreamMessage::Failed(error));
    }

    /// Returns true once the session stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, message: StreamMessage) {
        if self.tx.send(message).is_err() {
            trace!("Stream output closed, dropping message");
        }
    }
}

/// Shared view of the crop applied to a running stream's frames.
#[derive(Debug, Clone)]
pub struct CropHandle {
    crop: Arc<RwLock<Option<Rect>>>,
}

impl CropHandle {
    /// Replace the crop. Applies from the next delivered sample.
    pub fn set(&self, crop: Option<Rect>) {
        *self.crop.write() = crop;
    }

    pub fn get(&self) -> Option<Rect> {
        *self.crop.read()
    }
}
