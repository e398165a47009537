use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use photo_capture_core::mock::{CaptureScript, MockAuthorizer, MockBackend};
use photo_capture_core::{
    AuthorizationStatus, CameraAuthorizer, CameraService, CaptureError, PhotoCodec, SessionConfiguration,
    SessionObserver, SessionPreset,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> SessionConfiguration {
    SessionConfiguration {
        settle_delay_ms: 5,
        ..Default::default()
    }
}

fn running_service(backend: MockBackend) -> CameraService<MockBackend, MockAuthorizer> {
    init_logging();
    let service = CameraService::new(
        backend,
        MockAuthorizer::new(AuthorizationStatus::Authorized),
        config(),
    )
    .unwrap();
    service.start_session().unwrap();
    assert!(service.is_session_running());
    service
}

#[derive(Default)]
struct RecordingObserver {
    authorization: Mutex<Vec<AuthorizationStatus>>,
    running: Mutex<Vec<bool>>,
    errors: Mutex<Vec<CaptureError>>,
}

impl SessionObserver for RecordingObserver {
    fn on_authorization_changed(&self, status: AuthorizationStatus) {
        self.authorization.lock().push(status);
    }

    fn on_running_changed(&self, is_running: bool) {
        self.running.lock().push(is_running);
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }
}

#[test]
fn permission_then_capture() {
    init_logging();
    let mut service = CameraService::new(
        MockBackend::new(),
        MockAuthorizer::new(AuthorizationStatus::NotDetermined),
        config(),
    )
    .unwrap();
    let observer = Arc::new(RecordingObserver::default());
    service.set_observer(observer.clone());

    // Not yet authorized: start is a no-op.
    service.start_session().unwrap();
    assert!(!service.is_session_running());

    assert!(service.request_permission());
    assert_eq!(service.authorization_status(), AuthorizationStatus::Authorized);

    service.start_session().unwrap();
    let photo = service.capture_photo().unwrap();
    assert_eq!((photo.width(), photo.height()), (64, 48));

    service.stop_session().unwrap();

    assert_eq!(*observer.authorization.lock(), vec![AuthorizationStatus::Authorized]);
    assert_eq!(*observer.running.lock(), vec![true, false]);
    assert!(observer.errors.lock().is_empty());
}

#[test]
fn refused_permission() {
    init_logging();
    let service =
        CameraService::new(MockBackend::new(), MockAuthorizer::refusing(), config()).unwrap();

    assert!(!service.request_permission());
    assert_eq!(service.authorization_status(), AuthorizationStatus::Denied);

    service.start_session().unwrap();
    assert!(!service.is_session_running());
}

#[test]
fn authorizer_answers_each_request() {
    let authorizer = MockAuthorizer::refusing();

    for _ in 0..2 {
        let (tx, rx) = mpsc::channel();
        authorizer.request_access(Box::new(move |granted| {
            let _ = tx.send(granted);
        }));
        assert!(!rx.recv().unwrap());
    }

    assert_eq!(authorizer.requests(), 2);
    assert_eq!(authorizer.status(), AuthorizationStatus::Denied);
}

#[test]
fn restricted_status_is_rechecked() {
    init_logging();
    let service = CameraService::new(
        MockBackend::new(),
        MockAuthorizer::new(AuthorizationStatus::Restricted),
        config(),
    )
    .unwrap();

    assert!(!service.request_permission());
    assert_eq!(
        service.check_authorization_status(),
        AuthorizationStatus::Restricted
    );
}

#[test]
fn duplicate_terminal_callbacks_complete_once() {
    let backend = MockBackend::new().with_script(CaptureScript::DeliverTwice);
    let service = running_service(backend);

    let (tx, rx) = mpsc::channel();
    service
        .capture_photo_with(move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    assert!(rx.recv().unwrap().is_ok());
    // The duplicate must not produce a second result.
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn reported_failure_surfaces() {
    let backend = MockBackend::new().with_script(CaptureScript::Fail("sensor fault".into()));
    let mut service = running_service(backend);
    let observer = Arc::new(RecordingObserver::default());
    service.set_observer(observer.clone());

    assert_eq!(
        service.capture_photo().unwrap_err(),
        CaptureError::CaptureFailed("sensor fault".into())
    );
    assert_eq!(
        *observer.errors.lock(),
        vec![CaptureError::CaptureFailed("sensor fault".into())]
    );
}

#[test]
fn invalid_data_is_decode_failure() {
    let service = running_service(MockBackend::new().with_script(CaptureScript::InvalidData));
    assert!(matches!(
        service.capture_photo(),
        Err(CaptureError::ImageDecodeFailed(_))
    ));
}

#[test]
fn abandoned_capture_fails_and_frees_slot() {
    let backend = MockBackend::new().with_script(CaptureScript::Abandon);
    let handle = backend.handle();
    let service = running_service(backend);

    assert!(matches!(
        service.capture_photo(),
        Err(CaptureError::CaptureFailed(_))
    ));

    handle.set_script(CaptureScript::Deliver);
    assert!(service.capture_photo().is_ok());
    assert_eq!(handle.captures(), 2);
}

#[test]
fn uncompressed_photos_decode() {
    init_logging();
    let config = SessionConfiguration {
        codec: PhotoCodec::Uncompressed,
        settle_delay_ms: 5,
        ..Default::default()
    };
    let service = CameraService::new(
        MockBackend::new().with_frame_size(10, 7),
        MockAuthorizer::new(AuthorizationStatus::Authorized),
        config,
    )
    .unwrap();
    service.start_session().unwrap();

    let photo = service.capture_photo().unwrap();
    assert_eq!((photo.width(), photo.height()), (10, 7));
    assert_eq!(photo.image.get_pixel(3, 2), &image::Rgb([3, 2, 128]));
}

#[test]
fn unsupported_preset_still_configures() {
    init_logging();
    let config = SessionConfiguration {
        preset: SessionPreset::Low,
        settle_delay_ms: 5,
        ..Default::default()
    };
    let service = CameraService::new(
        MockBackend::new(),
        MockAuthorizer::new(AuthorizationStatus::Authorized),
        config,
    )
    .unwrap();

    service.start_session().unwrap();
    assert!(service.is_photo_output_ready());
    assert!(service.capture_photo().is_ok());
}

#[test]
fn front_camera_selected_by_config() {
    init_logging();
    let config = SessionConfiguration::from_json(r#"{"camera_position": "front", "settle_delay_ms": 5}"#)
        .unwrap();
    let service = CameraService::new(
        MockBackend::new(),
        MockAuthorizer::new(AuthorizationStatus::Authorized),
        config,
    )
    .unwrap();

    service.start_session().unwrap();
    assert_eq!(service.input_device().unwrap().id, "mock-front");
    assert_eq!(service.available_devices().len(), 2);
}

#[test]
fn drop_stops_running_backend() {
    let backend = MockBackend::new();
    let handle = backend.handle();
    let service = running_service(backend);

    drop(service);
    assert_eq!(handle.stops(), 1);
}

#[test]
fn drop_of_idle_service_does_not_stop() {
    init_logging();
    let backend = MockBackend::new();
    let handle = backend.handle();
    let service = CameraService::new(
        backend,
        MockAuthorizer::new(AuthorizationStatus::Authorized),
        config(),
    )
    .unwrap();

    drop(service);
    assert_eq!(handle.stops(), 0);
}

#[test]
fn sequential_captures() {
    let backend = MockBackend::new();
    let handle = backend.handle();
    let service = running_service(backend);

    let ids: Vec<_> = (0..3).map(|_| service.capture_photo().unwrap().settings_id).collect();
    assert_eq!(handle.captures(), 3);
    assert!(ids.windows(2).all(|w| w[0] != w[1]));
}
