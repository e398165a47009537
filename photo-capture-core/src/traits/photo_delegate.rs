use crate::models::error::CaptureError;
use crate::models::photo::{RawPhoto, ResolvedPhotoSettings};

/// Receives the lifecycle of one still capture.
///
/// Phases arrive in order: will-begin, will-capture, did-capture, did-finish.
/// Backends may repeat the terminal `did_finish_processing_photo` callback.
pub trait PhotoCaptureDelegate: Send + Sync {
    fn will_begin_capture(&self, _settings: &ResolvedPhotoSettings) {}

    fn will_capture_photo(&self, _settings: &ResolvedPhotoSettings) {}

    fn did_capture_photo(&self, _settings: &ResolvedPhotoSettings) {}

    /// Terminal callback carrying the photo data or the backend's error.
    fn did_finish_processing_photo(&self, photo: Result<RawPhoto, CaptureError>);
}
