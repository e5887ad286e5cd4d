//! Audio activity detection.

use crate::buffer::AudioBuffer;

/// Peak absolute sample value of every channel, normalized to [0, 1].
pub fn channel_peaks(buffer: &AudioBuffer) -> Vec<f32> {
    (0..buffer.channels())
        .map(|channel| {
            buffer
                .channel(channel)
                .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
        })
        .collect()
}

/// Returns true if the buffer contains no sound at all.
///
/// A buffer is silent only when the peak of every channel is exactly zero:
/// a single nonzero sample anywhere makes it non-silent. There is no noise
/// floor.
pub fn is_silent(buffer: &AudioBuffer) -> bool {
    channel_peaks(buffer).iter().all(|&peak| peak == 0.0)
}
