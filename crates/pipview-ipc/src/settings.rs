//! Persisted preview settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest allowed refresh frequency in Hz.
pub const MIN_REFRESH_FREQUENCY: u32 = 1;

/// Highest allowed refresh frequency in Hz.
pub const MAX_REFRESH_FREQUENCY: u32 = 60;

/// Lowest allowed inactivity threshold in seconds.
pub const MIN_INACTIVITY_THRESHOLD_SECS: u64 = 1;

/// Highest allowed inactivity threshold in seconds.
pub const MAX_INACTIVITY_THRESHOLD_SECS: u64 = 300;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings document could not be parsed.
    #[error("Invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Corner of the screen used when laying out previews in bulk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Corner {
    #[serde(rename = "Top Left")]
    TopLeft,
    #[default]
    #[serde(rename = "Top Right")]
    TopRight,
    #[serde(rename = "Bottom Left")]
    BottomLeft,
    #[serde(rename = "Bottom Right")]
    BottomRight,
}

impl Corner {
    /// Returns the display name for this corner.
    pub fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "Top Left",
            Self::TopRight => "Top Right",
            Self::BottomLeft => "Bottom Left",
            Self::BottomRight => "Bottom Right",
        }
    }
}

/// User-editable settings read by capture sessions.
///
/// Stored as a flat key/value document. Missing keys fall back to their
/// defaults, out-of-range values are clamped by [`PreviewSettings::sanitized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewSettings {
    /// Stream refresh frequency in Hz (1 - 60, default: 30).
    pub refresh_frequency: u32,

    /// Seconds without a new frame before a preview is marked inactive
    /// (1 - 300, default: 60).
    pub inactivity_threshold: u64,

    /// Default preview height in points (default: 200).
    pub capture_height: u32,

    /// Corner used when gathering previews (default: top right).
    pub capture_corner: Corner,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            refresh_frequency: 30,
            inactivity_threshold: 60,
            capture_height: 200,
            capture_corner: Corner::TopRight,
        }
    }
}

impl PreviewSettings {
    /// Parse settings from a JSON document and clamp them into range.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Serialize settings to a JSON document.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns a copy with every value clamped into its allowed range.
    pub fn sanitized(&self) -> Self {
        Self {
            refresh_frequency: self
                .refresh_frequency
                .clamp(MIN_REFRESH_FREQUENCY, MAX_REFRESH_FREQUENCY),
            inactivity_threshold: self
                .inactivity_threshold
                .clamp(MIN_INACTIVITY_THRESHOLD_SECS, MAX_INACTIVITY_THRESHOLD_SECS),
            capture_height: self.capture_height.max(1),
            capture_corner: self.capture_corner,
        }
    }

    /// Minimum interval between delivered frames.
    pub fn frame_interval(&self) -> Duration {
        let hz = self
            .refresh_frequency
            .clamp(MIN_REFRESH_FREQUENCY, MAX_REFRESH_FREQUENCY);
        Duration::from_secs(1) / hz
    }

    /// Time without frames after which a session is considered inactive.
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(
            self.inactivity_threshold
                .clamp(MIN_INACTIVITY_THRESHOLD_SECS, MAX_INACTIVITY_THRESHOLD_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PreviewSettings::default();

        assert_eq!(settings.refresh_frequency, 30);
        assert_eq!(settings.inactivity_threshold(), Duration::from_secs(60));
        assert_eq!(settings.capture_height, 200);
        assert_eq!(settings.capture_corner, Corner::TopRight);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings = PreviewSettings::from_json(r#"{ "refreshFrequency": 10 }"#).unwrap();

        assert_eq!(settings.refresh_frequency, 10);
        assert_eq!(settings.inactivity_threshold, 60);
        assert_eq!(settings.capture_corner, Corner::TopRight);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings = PreviewSettings::from_json(
            r#"{ "refreshFrequency": 500, "inactivityThreshold": 0, "captureCorner": "Bottom Left" }"#,
        )
        .unwrap();

        assert_eq!(settings.refresh_frequency, 60);
        assert_eq!(settings.inactivity_threshold, 1);
        assert_eq!(settings.capture_corner, Corner::BottomLeft);
    }

    #[test]
    fn test_frame_interval() {
        let settings = PreviewSettings {
            refresh_frequency: 20,
            ..Default::default()
        };
        assert_eq!(settings.frame_interval(), Duration::from_millis(50));

        let unclamped = PreviewSettings {
            refresh_frequency: 0,
            ..Default::default()
        };
        assert_eq!(unclamped.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_document() {
        assert!(PreviewSettings::from_json("not json").is_err());
    }
}
