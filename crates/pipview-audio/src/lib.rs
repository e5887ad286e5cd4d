//! PCM audio buffers and audio activity detection.
//!
//! Capture streams deliver audio packets in one of three sample encodings.
//! This crate decodes them into an [`AudioBuffer`] and decides whether a
//! packet carries any sound.

mod activity;
mod buffer;
mod error;

pub use activity::{channel_peaks, is_silent};
pub use buffer::{AudioBuffer, ChannelLayout, SampleEncoding, Samples};
pub use error::AudioError;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;
