use crate::models::authorization::AuthorizationStatus;
use crate::models::error::CaptureError;

/// Notifications for the UI layer.
///
/// Called from whichever thread made the change (caller or session queue).
/// Implementations should marshal to the UI thread if needed.
pub trait SessionObserver: Send + Sync {
    fn on_authorization_changed(&self, status: AuthorizationStatus);

    fn on_running_changed(&self, is_running: bool);

    /// Called when a session or capture operation fails.
    fn on_error(&self, error: &CaptureError);
}
