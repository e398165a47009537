use std::sync::Arc;

use crate::models::config::{CameraPosition, PhotoOutputConfig, SessionPreset};
use crate::models::device::CameraDevice;
use crate::models::error::CaptureError;
use crate::models::photo::PhotoSettings;
use crate::traits::photo_delegate::PhotoCaptureDelegate;

/// The platform capture session: input/output wiring and the running pipeline.
///
/// All calls are made from the `CameraService` session queue, one at a time.
/// Implemented by:
/// - `NokhwaBackend` (photo-capture-nokhwa)
/// - `MockBackend`
pub trait CaptureBackend: Send + 'static {
    /// Cameras currently attached.
    fn devices(&self) -> Vec<CameraDevice>;

    /// Default camera for `position`, if one exists.
    fn default_device(&self, position: CameraPosition) -> Option<CameraDevice> {
        self.devices().into_iter().find(|d| d.position == position)
    }

    /// Open a batch of configuration changes.
    fn begin_configuration(&mut self) {}

    /// Apply the batch opened by `begin_configuration`.
    fn commit_configuration(&mut self) {}

    fn supports_preset(&self, preset: SessionPreset) -> bool;

    fn set_preset(&mut self, preset: SessionPreset);

    /// Attach `device` as the session input.
    fn add_input(&mut self, device: &CameraDevice) -> Result<(), CaptureError>;

    /// Attach a photo output. Fails if the session cannot take one.
    fn add_photo_output(&mut self, config: &PhotoOutputConfig) -> Result<(), CaptureError>;

    /// Start the pipeline. May return before frames are flowing.
    fn start_running(&mut self) -> Result<(), CaptureError>;

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Issue a still capture.
    ///
    /// Lifecycle callbacks are delivered to `delegate` later, on any thread.
    /// The backend keeps `delegate` alive until it has delivered the terminal
    /// callback; dropping it earlier abandons the request.
    fn capture_photo(&mut self, settings: &PhotoSettings, delegate: Arc<dyn PhotoCaptureDelegate>);
}
