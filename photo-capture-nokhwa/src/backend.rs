//! nokhwa capture backend.
//!
//! The nokhwa camera is opened on a dedicated thread when the session starts
//! and lives there until it stops. Capture requests reach it over a channel;
//! lifecycle callbacks are delivered from that thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::{Buffer, Camera};
use parking_lot::Mutex;

use photo_capture_core::models::config::{
    CameraPosition, PhotoCodec, PhotoOutputConfig, SessionPreset,
};
use photo_capture_core::models::device::CameraDevice;
use photo_capture_core::models::error::CaptureError;
use photo_capture_core::models::photo::{PhotoSettings, PixelFormat, RawPhoto, ResolvedPhotoSettings};
use photo_capture_core::traits::capture_backend::CaptureBackend;
use photo_capture_core::traits::photo_delegate::PhotoCaptureDelegate;

use crate::device_enumerator::{camera_index, list_cameras};

enum CameraCommand {
    Capture {
        settings: PhotoSettings,
        delegate: Arc<dyn PhotoCaptureDelegate>,
    },
    Stop,
}

/// `CaptureBackend` over a nokhwa camera stream.
pub struct NokhwaBackend {
    preset: SessionPreset,
    input: Option<CameraIndex>,
    has_output: bool,
    running: Arc<AtomicBool>,
    commands: Option<mpsc::Sender<CameraCommand>>,
    camera_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl NokhwaBackend {
    pub fn new() -> Self {
        Self {
            preset: SessionPreset::Photo,
            input: None,
            has_output: false,
            running: Arc::new(AtomicBool::new(false)),
            commands: None,
            camera_handle: Mutex::new(None),
        }
    }
}

impl Default for NokhwaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for NokhwaBackend {
    fn devices(&self) -> Vec<CameraDevice> {
        list_cameras().unwrap_or_else(|e| {
            log::warn!("Camera enumeration failed: {}", e);
            Vec::new()
        })
    }

    /// Exact position match first; desktop cameras report no position, so
    /// fall back to the first camera.
    fn default_device(&self, position: CameraPosition) -> Option<CameraDevice> {
        let devices = self.devices();
        devices
            .iter()
            .find(|d| d.position == position)
            .or_else(|| devices.first())
            .cloned()
    }

    fn supports_preset(&self, _preset: SessionPreset) -> bool {
        true
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        self.preset = preset;
    }

    fn add_input(&mut self, device: &CameraDevice) -> Result<(), CaptureError> {
        if self.input.is_some() {
            return Err(CaptureError::ConfigurationFailed("input already attached".into()));
        }
        self.input = Some(camera_index(device));
        Ok(())
    }

    fn add_photo_output(&mut self, config: &PhotoOutputConfig) -> Result<(), CaptureError> {
        if self.has_output {
            return Err(CaptureError::ConfigurationFailed("photo output already attached".into()));
        }
        if config.live_photo_capture {
            log::debug!("Live photos not supported by nokhwa, ignoring");
        }
        self.has_output = true;
        Ok(())
    }

    fn start_running(&mut self) -> Result<(), CaptureError> {
        if self.commands.is_some() {
            if self.camera_thread_alive() {
                return Ok(());
            }
            // The stream died since the last start; reap it and open afresh.
            log::warn!("Camera thread exited, restarting");
            self.stop_running();
        }
        let index = self.input.clone().ok_or(CaptureError::SessionNotConfigured)?;
        let requested = requested_format(self.preset);

        let (sender, handle) = spawn_camera_thread(
            Arc::clone(&self.running),
            move || open_camera(index, requested),
            serve_commands,
        )?;

        self.commands = Some(sender);
        *self.camera_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop_running(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(CameraCommand::Stop);
        }
        if let Some(handle) = self.camera_handle.lock().take() {
            let _ = handle.join();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn capture_photo(&mut self, settings: &PhotoSettings, delegate: Arc<dyn PhotoCaptureDelegate>) {
        let Some(ref commands) = self.commands else {
            // Dropping the delegate reports the request as abandoned.
            log::error!("Capture {} requested with no camera stream", settings.unique_id());
            return;
        };
        let command = CameraCommand::Capture {
            settings: settings.clone(),
            delegate,
        };
        if commands.send(command).is_err() {
            log::error!("Camera thread gone, capture {} dropped", settings.unique_id());
        }
    }
}

impl NokhwaBackend {
    fn camera_thread_alive(&self) -> bool {
        self.camera_handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for NokhwaBackend {
    fn drop(&mut self) {
        self.stop_running();
    }
}

fn requested_format(preset: SessionPreset) -> RequestedFormat<'static> {
    let format_type = match preset {
        SessionPreset::Photo | SessionPreset::High => RequestedFormatType::AbsoluteHighestResolution,
        SessionPreset::Medium => RequestedFormatType::Closest(CameraFormat::new(
            Resolution::new(1280, 720),
            FrameFormat::MJPEG,
            30,
        )),
        SessionPreset::Low => RequestedFormatType::Closest(CameraFormat::new(
            Resolution::new(640, 480),
            FrameFormat::MJPEG,
            30,
        )),
    };
    RequestedFormat::new::<RgbFormat>(format_type)
}

type CameraThread = (mpsc::Sender<CameraCommand>, thread::JoinHandle<()>);

/// Spawn the camera thread and wait until `open` has run on it.
///
/// The camera is created on the thread that uses it. `running` is set while
/// `serve` runs. An open failure is returned here and the thread is joined.
fn spawn_camera_thread<C, O, S>(
    running: Arc<AtomicBool>,
    open: O,
    serve: S,
) -> Result<CameraThread, CaptureError>
where
    O: FnOnce() -> Result<C, CaptureError> + Send + 'static,
    S: FnOnce(C, mpsc::Receiver<CameraCommand>) + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let (opened_tx, opened_rx) = mpsc::sync_channel(1);

    let handle = thread::Builder::new()
        .name("nokhwa-camera".into())
        .spawn(move || {
            let camera = match open() {
                Ok(camera) => camera,
                Err(e) => {
                    let _ = opened_tx.send(Err(e));
                    return;
                }
            };
            running.store(true, Ordering::SeqCst);
            let _ = opened_tx.send(Ok(()));
            serve(camera, receiver);
            running.store(false, Ordering::SeqCst);
        })
        .map_err(|e| CaptureError::Unknown(format!("failed to spawn camera thread: {}", e)))?;

    match opened_rx.recv() {
        Ok(Ok(())) => Ok((sender, handle)),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(CaptureError::Unknown("camera thread exited before opening".into()))
        }
    }
}

fn open_camera(index: CameraIndex, requested: RequestedFormat<'static>) -> Result<Camera, CaptureError> {
    let mut camera = Camera::new(index, requested).map_err(|e| {
        log::error!("Failed to open camera: {}", e);
        CaptureError::CameraUnavailable
    })?;
    camera.open_stream().map_err(|e| {
        log::error!("Failed to open camera stream: {}", e);
        CaptureError::CameraUnavailable
    })?;

    let resolution = camera.resolution();
    log::info!(
        "Camera stream open at {}x{}",
        resolution.width(),
        resolution.height()
    );
    Ok(camera)
}

/// Serve capture requests until told to stop or the backend goes away.
fn serve_commands(mut camera: Camera, commands: mpsc::Receiver<CameraCommand>) {
    while let Ok(command) = commands.recv() {
        match command {
            CameraCommand::Capture { settings, delegate } => {
                capture_still(&mut camera, &settings, delegate.as_ref());
            }
            CameraCommand::Stop => break,
        }
    }

    if let Err(e) = camera.stop_stream() {
        log::warn!("Failed to stop camera stream: {}", e);
    }
}

fn capture_still(camera: &mut Camera, settings: &PhotoSettings, delegate: &dyn PhotoCaptureDelegate) {
    let resolution = camera.resolution();
    let resolved = settings.resolve(Some((resolution.width(), resolution.height())));

    delegate.will_begin_capture(&resolved);
    delegate.will_capture_photo(&resolved);
    let frame = camera.frame();
    delegate.did_capture_photo(&resolved);

    let result = frame
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))
        .and_then(|buffer| raw_photo(&buffer, settings.codec, resolved));
    delegate.did_finish_processing_photo(result);
}

/// MJPEG frames already are JPEG files; anything else is decoded to RGB here.
fn raw_photo(
    buffer: &Buffer,
    codec: PhotoCodec,
    resolved: ResolvedPhotoSettings,
) -> Result<RawPhoto, CaptureError> {
    if codec == PhotoCodec::Jpeg && buffer.source_frame_format() == FrameFormat::MJPEG {
        return Ok(RawPhoto {
            data: buffer.buffer().to_vec(),
            format: PixelFormat::Jpeg,
            resolved,
        });
    }

    let image = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| CaptureError::ImageDecodeFailed(e.to_string()))?;
    let (width, height) = image.dimensions();
    Ok(RawPhoto {
        data: image.into_raw(),
        format: PixelFormat::Rgb8 { width, height },
        resolved,
    })
}
