use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Upper bound on the post-start settle delay.
const MAX_SETTLE_DELAY_MS: u64 = 10_000;

/// Quality preset applied to the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    #[default]
    Photo,
    High,
    Medium,
    Low,
}

/// Which side of the device a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
    /// External or desktop cameras that report no position.
    Unspecified,
}

/// Encoding requested for captured photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCodec {
    #[default]
    Jpeg,
    Uncompressed,
}

/// Settings applied to the photo output when it is attached to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoOutputConfig {
    pub high_resolution_capture: bool,

    /// Only applied by backends that support live photos.
    pub live_photo_capture: bool,
}

impl Default for PhotoOutputConfig {
    fn default() -> Self {
        Self {
            high_resolution_capture: true,
            live_photo_capture: false,
        }
    }
}

/// Configuration for a camera session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Session preset, applied only when the backend supports it (default: photo).
    pub preset: SessionPreset,

    /// Camera used as the session input (default: back).
    pub camera_position: CameraPosition,

    pub photo_output: PhotoOutputConfig,

    /// Codec requested for each capture (default: JPEG).
    pub codec: PhotoCodec,

    /// Request high resolution stills on each capture (default: true).
    pub high_resolution_photos: bool,

    /// Fixed wait after starting the session before reading its running state (default: 1000).
    pub settle_delay_ms: u64,

    /// Name of the serial queue thread that owns session mutations.
    pub queue_label: String,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(format!(
                "settle delay {}ms exceeds {}ms",
                self.settle_delay_ms, MAX_SETTLE_DELAY_MS
            ));
        }
        if self.queue_label.trim().is_empty() {
            return Err("queue label must not be empty".into());
        }
        Ok(())
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(e.to_string()))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            preset: SessionPreset::Photo,
            camera_position: CameraPosition::Back,
            photo_output: PhotoOutputConfig::default(),
            codec: PhotoCodec::Jpeg,
            high_resolution_photos: true,
            settle_delay_ms: 1000,
            queue_label: "camera.session.queue".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = SessionConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settle_delay(), Duration::from_secs(1));
        assert_eq!(config.camera_position, CameraPosition::Back);
        assert!(config.photo_output.high_resolution_capture);
        assert!(!config.photo_output.live_photo_capture);
    }

    #[test]
    fn rejects_long_settle_delay() {
        let config = SessionConfiguration {
            settle_delay_ms: 60_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_blank_queue_label() {
        let config = SessionConfiguration {
            queue_label: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config =
            SessionConfiguration::from_json(r#"{"camera_position": "front", "settle_delay_ms": 250}"#)
                .unwrap();

        assert_eq!(config.camera_position, CameraPosition::Front);
        assert_eq!(config.settle_delay_ms, 250);
        assert_eq!(config.preset, SessionPreset::Photo);
        assert_eq!(config.queue_label, "camera.session.queue");
    }

    #[test]
    fn json_is_validated() {
        let err = SessionConfiguration::from_json(r#"{"settle_delay_ms": 99999}"#).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));

        let err = SessionConfiguration::from_json("not json").unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }
}
