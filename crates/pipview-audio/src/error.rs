//! Error types for the audio module.

use thiserror::Error;

/// Errors that can occur while building audio buffers.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Audio format not supported.
    #[error("Audio format not supported: {0}")]
    FormatNotSupported(String),

    /// Buffer contains no channels.
    #[error("Audio buffer must have at least one channel")]
    NoChannels,

    /// Sample count does not divide evenly into channels.
    #[error("{samples} samples cannot be split into {channels} channels")]
    ChannelMismatch { samples: usize, channels: u16 },

    /// Raw data length is not a whole number of samples.
    #[error("{len} bytes is not a multiple of the {sample_size}-byte sample size")]
    TruncatedSample { len: usize, sample_size: usize },
}
