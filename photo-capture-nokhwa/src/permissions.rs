//! Camera permission via nokhwa.
//!
//! On macOS, access is governed by TCC: the first request shows the system
//! consent dialog. Linux and Windows have no per-app camera consent for
//! desktop apps, so nokhwa reports access as granted there.

use parking_lot::Mutex;

use photo_capture_core::models::authorization::AuthorizationStatus;
use photo_capture_core::traits::authorizer::{AccessCallback, CameraAuthorizer};

/// `CameraAuthorizer` backed by `nokhwa_check` / `nokhwa_initialize`.
///
/// nokhwa only tells granted from not-granted, so a refusal reads back as
/// `NotDetermined` rather than `Denied`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NokhwaAuthorizer;

impl CameraAuthorizer for NokhwaAuthorizer {
    fn status(&self) -> AuthorizationStatus {
        if nokhwa::nokhwa_check() {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::NotDetermined
        }
    }

    fn request_access(&self, on_complete: AccessCallback) {
        // nokhwa takes a reusable callback; ours may only run once.
        let slot = Mutex::new(Some(on_complete));
        nokhwa::nokhwa_initialize(move |granted| {
            if let Some(callback) = slot.lock().take() {
                callback(granted);
            } else {
                log::warn!("Duplicate camera permission callback ignored");
            }
        });
    }
}
