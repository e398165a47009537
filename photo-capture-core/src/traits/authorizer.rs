use crate::models::authorization::AuthorizationStatus;

/// Callback fired once with the user's decision.
pub type AccessCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Platform camera permission check.
///
/// Implemented by:
/// - `NokhwaAuthorizer` (photo-capture-nokhwa)
/// - `MockAuthorizer` (tests, hosts without camera hardware)
pub trait CameraAuthorizer: Send + Sync {
    /// Current consent state. Must not prompt the user.
    fn status(&self) -> AuthorizationStatus;

    /// Ask the user for camera access.
    ///
    /// `on_complete` may fire on any thread, possibly before this returns.
    fn request_access(&self, on_complete: AccessCallback);
}
