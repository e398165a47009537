//! Camera enumeration via `nokhwa::query`.

use nokhwa::query;
use nokhwa::utils::{ApiBackend, CameraIndex};

use photo_capture_core::models::config::CameraPosition;
use photo_capture_core::models::device::CameraDevice;
use photo_capture_core::models::error::CaptureError;

/// List attached cameras.
///
/// nokhwa does not report which way a camera faces, so every device is
/// `CameraPosition::Unspecified`. No cameras is an empty list, not an error.
pub fn list_cameras() -> Result<Vec<CameraDevice>, CaptureError> {
    let cameras = query(ApiBackend::Auto)
        .map_err(|e| CaptureError::Unknown(format!("camera query failed: {}", e)))?;

    Ok(cameras
        .into_iter()
        .map(|info| {
            CameraDevice::new(
                info.index().to_string(),
                info.human_name(),
                CameraPosition::Unspecified,
            )
        })
        .collect())
}

/// Map a `CameraDevice` id produced by `list_cameras` back to a nokhwa index.
pub fn camera_index(device: &CameraDevice) -> CameraIndex {
    match device.id.parse::<u32>() {
        Ok(index) => CameraIndex::Index(index),
        Err(_) => CameraIndex::String(device.id.clone()),
    }
}
