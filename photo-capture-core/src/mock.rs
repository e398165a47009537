//! Scripted in-process camera backend.
//!
//! `MockBackend` behaves like a platform capture session without touching
//! hardware: capture lifecycle callbacks are delivered from a separate thread,
//! and a `CaptureScript` decides how each request ends. Hosts without a
//! camera and the test suites drive `CameraService` with it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::{Rgb, RgbImage};
use parking_lot::Mutex;

use crate::models::authorization::AuthorizationStatus;
use crate::models::config::{CameraPosition, PhotoCodec, PhotoOutputConfig, SessionPreset};
use crate::models::device::CameraDevice;
use crate::models::error::CaptureError;
use crate::models::photo::{PhotoSettings, PixelFormat, RawPhoto, ResolvedPhotoSettings};
use crate::processing::decode::encode_jpeg;
use crate::traits::authorizer::{AccessCallback, CameraAuthorizer};
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::photo_delegate::PhotoCaptureDelegate;

/// How the mock ends each capture request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureScript {
    /// One terminal callback carrying a JPEG (or RGB for uncompressed requests).
    #[default]
    Deliver,
    /// The terminal callback fires twice.
    DeliverTwice,
    /// The terminal callback reports an error.
    Fail(String),
    /// Terminal callback with bytes that are not an image.
    InvalidData,
    /// The delegate is dropped after the intermediate phases.
    Abandon,
    /// The request is parked until `MockHandle::release_held`.
    Hold,
}

type HeldCapture = (Arc<dyn PhotoCaptureDelegate>, Result<RawPhoto, CaptureError>);

#[derive(Default)]
struct MockShared {
    script: Mutex<CaptureScript>,
    held: Mutex<Vec<HeldCapture>>,
    preset: Mutex<Option<SessionPreset>>,
    configurations: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    captures: AtomicUsize,
}

/// Observes and steers a `MockBackend` after it has been moved into a service.
#[derive(Clone)]
pub struct MockHandle {
    shared: Arc<MockShared>,
}

impl MockHandle {
    pub fn set_script(&self, script: CaptureScript) {
        *self.shared.script.lock() = script;
    }

    /// Number of `begin_configuration` calls.
    pub fn configurations(&self) -> usize {
        self.shared.configurations.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.shared.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> usize {
        self.shared.captures.load(Ordering::SeqCst)
    }

    /// Preset applied by the last `set_preset`, if any.
    pub fn preset(&self) -> Option<SessionPreset> {
        *self.shared.preset.lock()
    }

    pub fn held(&self) -> usize {
        self.shared.held.lock().len()
    }

    /// Block until at least `count` requests are parked by `CaptureScript::Hold`.
    pub fn wait_for_held(&self, count: usize) {
        while self.held() < count {
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Deliver the terminal callback of every parked request.
    pub fn release_held(&self) {
        let held: Vec<HeldCapture> = self.shared.held.lock().drain(..).collect();
        for (delegate, result) in held {
            delegate.did_finish_processing_photo(result);
        }
    }
}

/// In-process `CaptureBackend` with scripted capture outcomes.
pub struct MockBackend {
    devices: Vec<CameraDevice>,
    accepts_output: bool,
    runs_on_start: bool,
    frame_size: (u32, u32),
    input: Option<CameraDevice>,
    has_output: bool,
    running: bool,
    shared: Arc<MockShared>,
}

impl MockBackend {
    /// A back and a front camera, output accepted, 64x48 frames.
    pub fn new() -> Self {
        Self {
            devices: vec![
                CameraDevice::new("mock-back", "Mock Back Camera", CameraPosition::Back),
                CameraDevice::new("mock-front", "Mock Front Camera", CameraPosition::Front),
            ],
            accepts_output: true,
            runs_on_start: true,
            frame_size: (64, 48),
            input: None,
            has_output: false,
            running: false,
            shared: Arc::new(MockShared::default()),
        }
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn with_devices(mut self, devices: Vec<CameraDevice>) -> Self {
        self.devices = devices;
        self
    }

    pub fn without_devices(self) -> Self {
        self.with_devices(Vec::new())
    }

    /// `add_photo_output` fails.
    pub fn rejecting_output(mut self) -> Self {
        self.accepts_output = false;
        self
    }

    /// `start_running` succeeds but the session never reports running.
    pub fn failing_to_run(mut self) -> Self {
        self.runs_on_start = false;
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    pub fn with_script(self, script: CaptureScript) -> Self {
        self.handle().set_script(script);
        self
    }

    fn photo_payload(&self, settings: &PhotoSettings) -> Result<RawPhoto, CaptureError> {
        let (width, height) = self.frame_size;
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let resolved = settings.resolve(Some(self.frame_size));

        match settings.codec {
            PhotoCodec::Jpeg => Ok(RawPhoto {
                data: encode_jpeg(&image)?,
                format: PixelFormat::Jpeg,
                resolved,
            }),
            PhotoCodec::Uncompressed => Ok(RawPhoto {
                data: image.into_raw(),
                format: PixelFormat::Rgb8 { width, height },
                resolved,
            }),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for MockBackend {
    fn devices(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn begin_configuration(&mut self) {
        self.shared.configurations.fetch_add(1, Ordering::SeqCst);
    }

    fn supports_preset(&self, preset: SessionPreset) -> bool {
        preset != SessionPreset::Low
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        *self.shared.preset.lock() = Some(preset);
    }

    fn add_input(&mut self, device: &CameraDevice) -> Result<(), CaptureError> {
        if self.input.is_some() {
            return Err(CaptureError::ConfigurationFailed("input already attached".into()));
        }
        self.input = Some(device.clone());
        Ok(())
    }

    fn add_photo_output(&mut self, _config: &PhotoOutputConfig) -> Result<(), CaptureError> {
        if !self.accepts_output || self.has_output {
            return Err(CaptureError::ConfigurationFailed("cannot add photo output".into()));
        }
        self.has_output = true;
        Ok(())
    }

    fn start_running(&mut self) -> Result<(), CaptureError> {
        self.shared.starts.fetch_add(1, Ordering::SeqCst);
        self.running = self.runs_on_start;
        Ok(())
    }

    fn stop_running(&mut self) {
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn capture_photo(&mut self, settings: &PhotoSettings, delegate: Arc<dyn PhotoCaptureDelegate>) {
        self.shared.captures.fetch_add(1, Ordering::SeqCst);

        let script = self.shared.script.lock().clone();
        let resolved = settings.resolve(Some(self.frame_size));
        let payload = self.photo_payload(settings);
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("mock-capture".into())
            .spawn(move || run_script(script, resolved, payload, delegate, &shared));
        if let Err(e) = spawned {
            log::error!("Failed to spawn mock capture thread: {}", e);
        }
    }
}

fn run_script(
    script: CaptureScript,
    resolved: ResolvedPhotoSettings,
    payload: Result<RawPhoto, CaptureError>,
    delegate: Arc<dyn PhotoCaptureDelegate>,
    shared: &MockShared,
) {
    delegate.will_begin_capture(&resolved);
    delegate.will_capture_photo(&resolved);
    delegate.did_capture_photo(&resolved);

    match script {
        CaptureScript::Deliver => delegate.did_finish_processing_photo(payload),
        CaptureScript::DeliverTwice => {
            delegate.did_finish_processing_photo(payload.clone());
            delegate.did_finish_processing_photo(payload);
        }
        CaptureScript::Fail(message) => {
            delegate.did_finish_processing_photo(Err(CaptureError::CaptureFailed(message)))
        }
        CaptureScript::InvalidData => delegate.did_finish_processing_photo(Ok(RawPhoto {
            data: vec![0xff, 0xd8, 0x00, 0x01],
            format: PixelFormat::Jpeg,
            resolved,
        })),
        CaptureScript::Abandon => drop(delegate),
        CaptureScript::Hold => shared.held.lock().push((delegate, payload)),
    }
}

/// In-process `CameraAuthorizer`.
///
/// A request moves `NotDetermined` to authorized or denied according to
/// `grants`; other states are left alone. The answer arrives on another thread.
pub struct MockAuthorizer {
    status: Arc<Mutex<AuthorizationStatus>>,
    grants: bool,
    requests: AtomicUsize,
}

impl MockAuthorizer {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
            grants: true,
            requests: AtomicUsize::new(0),
        }
    }

    /// Not yet asked; the user will refuse.
    pub fn refusing() -> Self {
        Self {
            grants: false,
            ..Self::new(AuthorizationStatus::NotDetermined)
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl CameraAuthorizer for MockAuthorizer {
    fn status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    fn request_access(&self, on_complete: AccessCallback) {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let granted = {
            let mut status = self.status.lock();
            if status.can_request() {
                *status = if self.grants {
                    AuthorizationStatus::Authorized
                } else {
                    AuthorizationStatus::Denied
                };
            }
            status.is_authorized()
        };

        let spawned = thread::Builder::new()
            .name("mock-authorizer".into())
            .spawn(move || on_complete(granted));
        if let Err(e) = spawned {
            log::error!("Failed to spawn mock authorizer thread: {}", e);
        }
    }
}
