use serde::{Deserialize, Serialize};

use super::config::CameraPosition;

/// A camera as reported by a capture backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: String,
    pub name: String,
    pub position: CameraPosition,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: CameraPosition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
        }
    }
}
