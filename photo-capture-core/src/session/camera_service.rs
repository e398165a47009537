use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::authorization::AuthorizationStatus;
use crate::models::config::SessionConfiguration;
use crate::models::device::CameraDevice;
use crate::models::error::CaptureError;
use crate::models::photo::{Photo, PhotoSettings};
use crate::session::completion::PhotoCaptureHandler;
use crate::session::serial_queue::SerialQueue;
use crate::traits::authorizer::CameraAuthorizer;
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::photo_delegate::PhotoCaptureDelegate;
use crate::traits::session_observer::SessionObserver;

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionState {
    authorization: AuthorizationStatus,
    is_running: bool,
    is_configured: bool,
    photo_output_ready: bool,
    input_device: Option<CameraDevice>,
    capture_in_flight: Option<u64>,
}

impl SessionState {
    fn new(authorization: AuthorizationStatus) -> Self {
        Self {
            authorization,
            is_running: false,
            is_configured: false,
            photo_output_ready: false,
            input_device: None,
            capture_in_flight: None,
        }
    }
}

/// Camera session facade: permission checks, session lifecycle and
/// single-shot photo capture over a platform `CaptureBackend`.
///
/// Backend mutations (configuration, start, stop, capture requests) run on a
/// dedicated serial queue:
/// ```text
/// caller ──start/stop/capture──▶ [session queue] ──▶ CaptureBackend
///    ▲                                                    │
///    └──────── one result ◀── PhotoCaptureHandler ◀───────┘ (lifecycle callbacks)
/// ```
pub struct CameraService<B: CaptureBackend, A: CameraAuthorizer> {
    backend: Arc<Mutex<B>>,
    authorizer: A,
    config: SessionConfiguration,
    session_state: Arc<Mutex<SessionState>>,
    observer: Option<Arc<dyn SessionObserver>>,
    queue: SerialQueue,
}

impl<B: CaptureBackend, A: CameraAuthorizer> CameraService<B, A> {
    pub fn new(backend: B, authorizer: A, config: SessionConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let queue = SerialQueue::new(&config.queue_label)?;
        let authorization = authorizer.status();
        log::info!("Camera authorization status: {:?}", authorization);

        Ok(Self {
            backend: Arc::new(Mutex::new(backend)),
            authorizer,
            config,
            session_state: Arc::new(Mutex::new(SessionState::new(authorization))),
            observer: None,
            queue,
        })
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.config
    }

    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.session_state.lock().authorization
    }

    pub fn is_session_running(&self) -> bool {
        self.session_state.lock().is_running
    }

    /// Whether a photo output is attached. Captures fail until it is.
    pub fn is_photo_output_ready(&self) -> bool {
        self.session_state.lock().photo_output_ready
    }

    /// The camera attached as session input, once configured.
    pub fn input_device(&self) -> Option<CameraDevice> {
        self.session_state.lock().input_device.clone()
    }

    pub fn available_devices(&self) -> Vec<CameraDevice> {
        self.backend.lock().devices()
    }

    /// Re-read the consent state from the platform.
    pub fn check_authorization_status(&self) -> AuthorizationStatus {
        let status = self.authorizer.status();
        log::debug!("Camera authorization status: {:?}", status);
        self.set_authorization(status);
        status
    }

    /// Ask the user for camera access and block until they answer.
    ///
    /// Returns the grant decision. The cached status is refreshed from the
    /// platform afterwards, so it can differ from the bare grant (restricted).
    pub fn request_permission(&self) -> bool {
        log::info!("Requesting camera permission");

        let (tx, rx) = mpsc::sync_channel(1);
        self.authorizer.request_access(Box::new(move |granted| {
            let _ = tx.send(granted);
        }));
        // A dropped callback counts as a refusal.
        let granted = rx.recv().unwrap_or(false);

        self.check_authorization_status();
        log::info!("Camera permission granted: {}", granted);
        granted
    }

    /// Configure (first time only) and start the session.
    ///
    /// Does nothing if access is not authorized or the session is already
    /// running. After the backend starts, waits the configured settle delay
    /// and then records whether the backend reports itself running.
    pub fn start_session(&self) -> Result<(), CaptureError> {
        let authorization = self.authorization_status();
        if !authorization.is_authorized() {
            log::warn!("Camera not authorized ({:?}), session not started", authorization);
            return Ok(());
        }
        if self.is_session_running() {
            log::debug!("Camera session already running");
            return Ok(());
        }

        log::info!("Starting camera session");
        let backend = Arc::clone(&self.backend);
        let session_state = Arc::clone(&self.session_state);
        let config = self.config.clone();

        let started = self
            .queue
            .sync(move || {
                let mut backend = backend.lock();
                if !session_state.lock().is_configured {
                    configure_session(&mut *backend, &session_state, &config)?;
                }
                // An overlapping start may already have started the backend
                // while its caller is still waiting out the settle delay.
                if backend.is_running() {
                    log::debug!("Capture pipeline already started");
                    return Ok(());
                }
                backend.start_running()
            })
            .and_then(|result| result);

        if let Err(e) = started {
            log::error!("Failed to start camera session: {}", e);
            self.notify_error(&e);
            return Err(e);
        }

        thread::sleep(self.config.settle_delay());

        let running = self.backend.lock().is_running();
        log::info!("Camera session started, running: {}", running);
        self.set_running(running);
        Ok(())
    }

    /// Stop the session. Returns once the session queue has stopped the backend.
    pub fn stop_session(&self) -> Result<(), CaptureError> {
        log::info!("Stopping camera session");
        let backend = Arc::clone(&self.backend);
        self.queue.sync(move || backend.lock().stop_running())?;
        self.set_running(false);
        Ok(())
    }

    /// Issue a capture and deliver its outcome to `completion`.
    ///
    /// Returns an error without calling `completion` if the photo output is
    /// not attached, the session is not running, or another capture is in
    /// flight. Otherwise `completion` runs exactly once, on a backend or
    /// session queue thread; it must not call back into this service
    /// synchronously.
    pub fn capture_photo_with<F>(&self, completion: F) -> Result<(), CaptureError>
    where
        F: FnOnce(Result<Photo, CaptureError>) + Send + 'static,
    {
        let settings = PhotoSettings::from_config(&self.config);
        let settings_id = settings.unique_id();

        let admitted = {
            let mut s = self.session_state.lock();
            if !s.photo_output_ready {
                Err(CaptureError::SessionNotConfigured)
            } else if !s.is_running {
                Err(CaptureError::SessionNotRunning)
            } else if s.capture_in_flight.is_some() {
                Err(CaptureError::CaptureInProgress)
            } else {
                s.capture_in_flight = Some(settings_id);
                Ok(())
            }
        };
        if let Err(e) = admitted {
            log::error!("Cannot capture photo: {}", e);
            self.notify_error(&e);
            return Err(e);
        }

        log::info!("Capturing photo {}", settings_id);

        let session_state = Arc::clone(&self.session_state);
        let observer = self.observer.clone();
        let handler: Arc<dyn PhotoCaptureDelegate> =
            Arc::new(PhotoCaptureHandler::new(settings_id, move |result| {
                session_state.lock().capture_in_flight = None;
                match &result {
                    Ok(photo) => log::info!(
                        "Photo {} captured: {}x{}",
                        settings_id,
                        photo.width(),
                        photo.height()
                    ),
                    Err(e) => {
                        log::error!("Photo {} failed: {}", settings_id, e);
                        if let Some(ref o) = observer {
                            o.on_error(e);
                        }
                    }
                }
                completion(result);
            }));

        let backend = Arc::clone(&self.backend);
        // On failure the job is dropped with the handler inside it, which
        // reports the capture as abandoned through `completion`.
        if let Err(e) = self.queue.dispatch(move || {
            backend.lock().capture_photo(&settings, handler);
        }) {
            log::error!("Failed to dispatch capture {}: {}", settings_id, e);
        }
        Ok(())
    }

    /// Capture a photo, blocking until the backend delivers it.
    ///
    /// There is no timeout: a backend that never completes or drops the
    /// request blocks the caller indefinitely.
    pub fn capture_photo(&self) -> Result<Photo, CaptureError> {
        if self.queue.is_current() {
            return Err(CaptureError::Unknown(
                "capture_photo called from the session queue".into(),
            ));
        }

        let (tx, rx) = mpsc::sync_channel(1);
        self.capture_photo_with(move |result| {
            let _ = tx.send(result);
        })?;

        rx.recv()
            .map_err(|_| CaptureError::CaptureFailed("capture completion dropped".into()))?
    }

    // --- Internal helpers ---

    fn set_authorization(&self, status: AuthorizationStatus) {
        let changed = {
            let mut s = self.session_state.lock();
            let changed = s.authorization != status;
            s.authorization = status;
            changed
        };
        if changed {
            if let Some(ref observer) = self.observer {
                observer.on_authorization_changed(status);
            }
        }
    }

    fn set_running(&self, is_running: bool) {
        let changed = {
            let mut s = self.session_state.lock();
            let changed = s.is_running != is_running;
            s.is_running = is_running;
            changed
        };
        if changed {
            if let Some(ref observer) = self.observer {
                observer.on_running_changed(is_running);
            }
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(ref observer) = self.observer {
            observer.on_error(error);
        }
    }
}

impl<B: CaptureBackend, A: CameraAuthorizer> Drop for CameraService<B, A> {
    fn drop(&mut self) {
        if !self.backend.lock().is_running() {
            return;
        }
        let backend = Arc::clone(&self.backend);
        if let Err(e) = self.queue.dispatch(move || backend.lock().stop_running()) {
            log::warn!("Failed to stop camera session on drop: {}", e);
        }
    }
}

/// Wire input and output into the session. Runs on the session queue.
///
/// The session counts as configured only when an input was attached; a
/// failed photo output is logged and leaves captures unavailable.
fn configure_session<B: CaptureBackend>(
    backend: &mut B,
    session_state: &Mutex<SessionState>,
    config: &SessionConfiguration,
) -> Result<(), CaptureError> {
    log::info!("Configuring capture session");
    backend.begin_configuration();
    let result = attach_input_and_output(backend, session_state, config);
    backend.commit_configuration();

    if result.is_ok() {
        session_state.lock().is_configured = true;
        log::info!("Capture session configured");
    }
    result
}

fn attach_input_and_output<B: CaptureBackend>(
    backend: &mut B,
    session_state: &Mutex<SessionState>,
    config: &SessionConfiguration,
) -> Result<(), CaptureError> {
    if backend.supports_preset(config.preset) {
        backend.set_preset(config.preset);
    } else {
        log::debug!("Session preset {:?} not supported, keeping default", config.preset);
    }

    let device = backend.default_device(config.camera_position).ok_or_else(|| {
        log::error!("No {:?} camera available", config.camera_position);
        CaptureError::CameraUnavailable
    })?;

    backend.add_input(&device).map_err(|e| {
        log::error!("Failed to add camera input {}: {}", device.name, e);
        CaptureError::CameraUnavailable
    })?;
    log::info!("Camera input added: {}", device.name);
    session_state.lock().input_device = Some(device);

    match backend.add_photo_output(&config.photo_output) {
        Ok(()) => {
            session_state.lock().photo_output_ready = true;
            log::info!("Photo output added");
        }
        Err(e) => log::error!("Failed to add photo output: {}", e),
    }
    Ok(())
}
