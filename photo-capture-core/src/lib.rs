//! # photo-capture-core
//!
//! Platform-agnostic camera session facade.
//!
//! Provides permission checks, session lifecycle, and single-shot photo
//! capture. Platform backends (nokhwa, or any native camera API) implement
//! the `CaptureBackend` and `CameraAuthorizer` traits and plug into the
//! generic `CameraService`.
//!
//! ## Architecture
//!
//! ```text
//! photo-capture-core (this crate)
//! ├── traits/       ← CaptureBackend, CameraAuthorizer, PhotoCaptureDelegate, SessionObserver
//! ├── models/       ← CaptureError, AuthorizationStatus, SessionConfiguration, Photo, etc.
//! ├── processing/   ← photo decoding
//! ├── session/      ← CameraService, PhotoCaptureHandler, SerialQueue
//! └── mock          ← scripted in-process backend
//! ```

pub mod mock;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::authorization::AuthorizationStatus;
pub use models::config::{CameraPosition, PhotoCodec, PhotoOutputConfig, SessionConfiguration, SessionPreset};
pub use models::device::CameraDevice;
pub use models::error::CaptureError;
pub use models::photo::{Photo, PhotoSettings, PixelFormat, RawPhoto, ResolvedPhotoSettings};
pub use processing::decode::decode_photo;
pub use session::camera_service::CameraService;
pub use session::completion::PhotoCaptureHandler;
pub use session::serial_queue::SerialQueue;
pub use traits::authorizer::{AccessCallback, CameraAuthorizer};
pub use traits::capture_backend::CaptureBackend;
pub use traits::photo_delegate::PhotoCaptureDelegate;
pub use traits::session_observer::SessionObserver;
