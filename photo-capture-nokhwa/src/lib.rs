//! # photo-capture-nokhwa
//!
//! nokhwa backend for photo-capture-kit (enable the `native` feature).
//!
//! Provides:
//! - `NokhwaBackend`: `CaptureBackend` over a nokhwa camera stream
//! - `NokhwaAuthorizer`: camera permission via nokhwa's platform check
//! - `device_enumerator`: camera enumeration via `nokhwa::query`
//!
//! ## Platform Requirements
//! - Linux: V4L2 headers
//! - macOS: AVFoundation (the permission prompt needs an app bundle with `NSCameraUsageDescription`)
//! - Windows: Media Foundation
//!
//! ## Usage
//! ```ignore
//! use photo_capture_core::{CameraService, SessionConfiguration};
//! use photo_capture_nokhwa::{NokhwaAuthorizer, NokhwaBackend};
//!
//! let service = CameraService::new(NokhwaBackend::new(), NokhwaAuthorizer, SessionConfiguration::default())?;
//! if service.request_permission() {
//!     service.start_session()?;
//!     let photo = service.capture_photo()?;
//! }
//! ```

#[cfg(feature = "native")]
pub mod backend;
#[cfg(feature = "native")]
pub mod device_enumerator;
#[cfg(feature = "native")]
pub mod permissions;

#[cfg(feature = "native")]
pub use backend::NokhwaBackend;
#[cfg(feature = "native")]
pub use permissions::NokhwaAuthorizer;
