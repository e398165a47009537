use thiserror::Error;

/// Errors that can occur while configuring the camera session or capturing a photo.
///
/// None of these are retried; they propagate straight to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera unavailable")]
    CameraUnavailable,

    #[error("capture session not configured")]
    SessionNotConfigured,

    #[error("capture session not running")]
    SessionNotRunning,

    #[error("image decode failed: {0}")]
    ImageDecodeFailed(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("a capture is already in progress")]
    CaptureInProgress,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
