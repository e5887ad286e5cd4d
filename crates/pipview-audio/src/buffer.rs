//! PCM audio buffers as delivered by the capture stream.

use bytes::Buf;

use crate::error::AudioError;
use crate::AudioResult;

/// Numeric encoding of the samples in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Native 32-bit floating point in [-1, 1].
    Float32,

    /// Signed 16-bit integer.
    Int16,

    /// Signed 32-bit integer.
    Int32,
}

impl SampleEncoding {
    /// Size of one sample in bytes.
    pub fn sample_size(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Int16 => 2,
        }
    }
}

/// How channels are arranged in the sample storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// `L R L R ...`
    Interleaved,

    /// `L L ... R R ...`, one contiguous run per channel.
    Planar,
}

/// Sample storage in its original encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Float32(Vec<f32>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
}

impl Samples {
    /// Total number of samples across all channels.
    pub fn len(&self) -> usize {
        match self {
            Self::Float32(s) => s.len(),
            Self::Int16(s) => s.len(),
            Self::Int32(s) => s.len(),
        }
    }

    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The encoding of these samples.
    pub fn encoding(&self) -> SampleEncoding {
        match self {
            Self::Float32(_) => SampleEncoding::Float32,
            Self::Int16(_) => SampleEncoding::Int16,
            Self::Int32(_) => SampleEncoding::Int32,
        }
    }

    /// Sample at `index`, normalized to the floating point range.
    ///
    /// Integer samples are divided by the type's maximum positive value.
    fn normalized(&self, index: usize) -> f32 {
        match self {
            Self::Float32(s) => s[index],
            Self::Int16(s) => s[index] as f32 / i16::MAX as f32,
            Self::Int32(s) => s[index] as f32 / i32::MAX as f32,
        }
    }
}

/// A buffer of multi-channel PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Samples,
    channels: u16,
    layout: ChannelLayout,
}

impl AudioBuffer {
    /// Create a buffer from decoded samples.
    pub fn new(samples: Samples, channels: u16, layout: ChannelLayout) -> AudioResult<Self> {
        if channels == 0 {
            return Err(AudioError::NoChannels);
        }

        if samples.len() % channels as usize != 0 {
            return Err(AudioError::ChannelMismatch {
                samples: samples.len(),
                channels,
            });
        }

        Ok(Self {
            samples,
            channels,
            layout,
        })
    }

    /// Decode a buffer from raw little-endian PCM bytes.
    pub fn from_le_bytes(
        mut data: &[u8],
        encoding: SampleEncoding,
        channels: u16,
        layout: ChannelLayout,
    ) -> AudioResult<Self> {
        let sample_size = encoding.sample_size();
        if data.len() % sample_size != 0 {
            return Err(AudioError::TruncatedSample {
                len: data.len(),
                sample_size,
            });
        }

        let count = data.len() / sample_size;
        let samples = match encoding {
            SampleEncoding::Float32 => {
                Samples::Float32((0..count).map(|_| data.get_f32_le()).collect())
            }
            SampleEncoding::Int16 => Samples::Int16((0..count).map(|_| data.get_i16_le()).collect()),
            SampleEncoding::Int32 => Samples::Int32((0..count).map(|_| data.get_i32_le()).collect()),
        };

        Self::new(samples, channels, layout)
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.samples.encoding()
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Normalized samples of a single channel, in frame order.
    ///
    /// Yields nothing if `channel` is out of range.
    pub fn channel(&self, channel: u16) -> impl Iterator<Item = f32> + '_ {
        let frames = if channel < self.channels {
            self.frames()
        } else {
            0
        };

        (0..frames).map(move |frame| self.samples.normalized(self.index(channel, frame)))
    }

    fn index(&self, channel: u16, frame: usize) -> usize {
        match self.layout {
            ChannelLayout::Interleaved => frame * self.channels as usize + channel as usize,
            ChannelLayout::Planar => channel as usize * self.frames() + frame,
        }
    }
}
