use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::photo::{Photo, RawPhoto, ResolvedPhotoSettings};
use crate::processing::decode::decode_photo;
use crate::traits::photo_delegate::PhotoCaptureDelegate;

/// Completion handler for a single capture request.
pub type PhotoCompletion = Box<dyn FnOnce(Result<Photo, CaptureError>) + Send + 'static>;

/// Adapts the multi-phase capture protocol into one terminal result.
///
/// The completion runs at most once. Duplicate terminal callbacks are
/// logged and ignored. If the backend drops the handler without a terminal
/// callback, the completion runs with `CaptureFailed` instead.
pub struct PhotoCaptureHandler {
    settings_id: u64,
    completed: AtomicBool,
    completion: Mutex<Option<PhotoCompletion>>,
}

impl PhotoCaptureHandler {
    pub fn new<F>(settings_id: u64, completion: F) -> Self
    where
        F: FnOnce(Result<Photo, CaptureError>) + Send + 'static,
    {
        Self {
            settings_id,
            completed: AtomicBool::new(false),
            completion: Mutex::new(Some(Box::new(completion))),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Claim the completion. Returns `None` if it has already been claimed.
    fn claim(&self) -> Option<PhotoCompletion> {
        if self.completed.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.completion.lock().take()
    }

    fn finish(&self, result: Result<RawPhoto, CaptureError>) -> Result<Photo, CaptureError> {
        let raw = result.inspect_err(|e| log::error!("Capture {} failed: {}", self.settings_id, e))?;
        log::debug!("Capture {} returned {} bytes", self.settings_id, raw.data.len());

        let resolved_id = raw.resolved.unique_id;
        let image = decode_photo(raw)
            .inspect_err(|e| log::error!("Capture {}: {}", self.settings_id, e))?;
        log::info!(
            "Capture {} decoded {}x{}",
            self.settings_id,
            image.width(),
            image.height()
        );
        Ok(Photo::new(resolved_id, image))
    }
}

impl PhotoCaptureDelegate for PhotoCaptureHandler {
    fn will_begin_capture(&self, settings: &ResolvedPhotoSettings) {
        log::debug!("Capture {} will begin", settings.unique_id);
    }

    fn will_capture_photo(&self, settings: &ResolvedPhotoSettings) {
        log::debug!("Capture {} will capture", settings.unique_id);
    }

    fn did_capture_photo(&self, settings: &ResolvedPhotoSettings) {
        log::debug!("Capture {} captured", settings.unique_id);
    }

    fn did_finish_processing_photo(&self, photo: Result<RawPhoto, CaptureError>) {
        let Some(completion) = self.claim() else {
            log::warn!("Capture {}: duplicate completion ignored", self.settings_id);
            return;
        };
        completion(self.finish(photo));
    }
}

impl Drop for PhotoCaptureHandler {
    fn drop(&mut self) {
        if let Some(completion) = self.claim() {
            log::warn!("Capture {} abandoned by backend", self.settings_id);
            completion(Err(CaptureError::CaptureFailed(
                "capture abandoned before completion".into(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::PhotoCodec;
    use crate::models::photo::{PhotoSettings, PixelFormat};
    use crate::processing::decode::encode_jpeg;
    use image::RgbImage;
    use std::sync::Arc;

    fn jpeg_photo(settings: &PhotoSettings) -> RawPhoto {
        let image = RgbImage::from_pixel(16, 12, image::Rgb([10, 120, 200]));
        RawPhoto {
            data: encode_jpeg(&image).unwrap(),
            format: PixelFormat::Jpeg,
            resolved: settings.resolve(Some((16, 12))),
        }
    }

    type Results = Arc<Mutex<Vec<Result<Photo, CaptureError>>>>;

    fn recording_handler(settings: &PhotoSettings) -> (PhotoCaptureHandler, Results) {
        let results: Results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        let handler = PhotoCaptureHandler::new(settings.unique_id(), move |r| sink.lock().push(r));
        (handler, results)
    }

    #[test]
    fn full_protocol_completes_once() {
        let settings = PhotoSettings::new(PhotoCodec::Jpeg);
        let (handler, results) = recording_handler(&settings);
        let resolved = settings.resolve(Some((16, 12)));

        handler.will_begin_capture(&resolved);
        handler.will_capture_photo(&resolved);
        handler.did_capture_photo(&resolved);
        assert!(results.lock().is_empty());
        assert!(!handler.is_completed());

        handler.did_finish_processing_photo(Ok(jpeg_photo(&settings)));
        assert!(handler.is_completed());

        let results = results.lock();
        assert_eq!(results.len(), 1);
        let photo = results[0].as_ref().unwrap();
        assert_eq!((photo.width(), photo.height()), (16, 12));
        assert_eq!(photo.settings_id, settings.unique_id());
    }

    #[test]
    fn duplicate_terminal_callbacks_ignored() {
        let settings = PhotoSettings::new(PhotoCodec::Jpeg);
        let (handler, results) = recording_handler(&settings);

        handler.did_finish_processing_photo(Ok(jpeg_photo(&settings)));
        handler.did_finish_processing_photo(Err(CaptureError::CaptureFailed("late".into())));
        handler.did_finish_processing_photo(Ok(jpeg_photo(&settings)));
        drop(handler);

        let results = results.lock();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn reported_error_passes_through() {
        let settings = PhotoSettings::new(PhotoCodec::Jpeg);
        let (handler, results) = recording_handler(&settings);

        handler.did_finish_processing_photo(Err(CaptureError::CaptureFailed("sensor".into())));

        assert_eq!(
            results.lock()[0].as_ref().unwrap_err(),
            &CaptureError::CaptureFailed("sensor".into())
        );
    }

    #[test]
    fn undecodable_data_is_decode_failure() {
        let settings = PhotoSettings::new(PhotoCodec::Jpeg);
        let (handler, results) = recording_handler(&settings);

        handler.did_finish_processing_photo(Ok(RawPhoto {
            data: vec![0xde, 0xad],
            format: PixelFormat::Jpeg,
            resolved: settings.resolve(None),
        }));

        assert!(matches!(
            results.lock()[0],
            Err(CaptureError::ImageDecodeFailed(_))
        ));
    }

    #[test]
    fn dropped_without_terminal_callback_fails() {
        let settings = PhotoSettings::new(PhotoCodec::Jpeg);
        let (handler, results) = recording_handler(&settings);

        handler.will_begin_capture(&settings.resolve(None));
        drop(handler);

        let results = results.lock();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(CaptureError::CaptureFailed(_))));
    }

    #[test]
    fn concurrent_terminal_callbacks_complete_once() {
        let settings = PhotoSettings::new(PhotoCodec::Jpeg);
        let (handler, results) = recording_handler(&settings);
        let handler = Arc::new(handler);
        let raw = jpeg_photo(&settings);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let handler = Arc::clone(&handler);
                let raw = raw.clone();
                std::thread::spawn(move || handler.did_finish_processing_photo(Ok(raw)))
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        drop(handler);

        assert_eq!(results.lock().len(), 1);
    }
}
