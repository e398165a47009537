use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use image::RgbImage;

use super::config::{PhotoCodec, SessionConfiguration};

static NEXT_SETTINGS_ID: AtomicU64 = AtomicU64::new(1);

/// Per-request capture settings. Each instance carries a process-unique id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSettings {
    unique_id: u64,
    pub codec: PhotoCodec,
    pub high_resolution: bool,
}

impl PhotoSettings {
    pub fn new(codec: PhotoCodec) -> Self {
        Self {
            unique_id: NEXT_SETTINGS_ID.fetch_add(1, Ordering::Relaxed),
            codec,
            high_resolution: false,
        }
    }

    pub fn from_config(config: &SessionConfiguration) -> Self {
        let mut settings = Self::new(config.codec);
        settings.high_resolution =
            config.high_resolution_photos && config.photo_output.high_resolution_capture;
        settings
    }

    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Resolve these settings against what the backend will actually produce.
    pub fn resolve(&self, dimensions: Option<(u32, u32)>) -> ResolvedPhotoSettings {
        ResolvedPhotoSettings {
            unique_id: self.unique_id,
            codec: self.codec,
            dimensions,
        }
    }
}

/// Settings as resolved by the backend for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPhotoSettings {
    pub unique_id: u64,
    pub codec: PhotoCodec,
    pub dimensions: Option<(u32, u32)>,
}

/// Layout of the bytes in a [`RawPhoto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// A complete encoded JPEG file.
    Jpeg,
    /// Packed 8-bit RGB, row-major, no padding.
    Rgb8 { width: u32, height: u32 },
}

/// Undecoded photo data delivered by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPhoto {
    pub data: Vec<u8>,
    pub format: PixelFormat,
    pub resolved: ResolvedPhotoSettings,
}

/// A decoded, displayable photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: uuid::Uuid,
    pub settings_id: u64,
    pub image: RgbImage,
    pub captured_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(settings_id: u64, image: RgbImage) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            settings_id,
            image,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
