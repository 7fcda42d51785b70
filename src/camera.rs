// Opens the webcam and hands out RGB frames for the hand detector.
// The capture thread owns the camera; nothing else touches it.

use crate::config::CameraSettings;
use crate::error::Error;

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use image::RgbImage;

/// Anything that can produce frames, one blocking read at a time.
pub trait FrameSource {
    /// Block until the next frame is available.
    fn next_frame(&mut self) -> Result<RgbImage, Error>;
}

// A small wrapper around nokhwa::Camera so the capture loop stays clean.
pub struct CameraCapture {
    cam: Camera,
}

impl CameraCapture {
    /// Open the configured device at the requested resolution (falls back to the closest).
    pub fn open(settings: &CameraSettings) -> Result<Self, Error> {
        let idx = CameraIndex::Index(settings.index);

        let fmt = CameraFormat::new(
            Resolution::new(settings.width, settings.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            settings.fps,
        );

        // Ask for RGB frames closest to the requested format.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // This fails if no device exists at that index.
        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("create camera {}: {e}", settings.index)))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        log::info!(
            "camera {} streaming at {}x{}",
            settings.index,
            actual.width(),
            actual.height()
        );

        Ok(Self { cam })
    }
}

impl FrameSource for CameraCapture {
    fn next_frame(&mut self) -> Result<RgbImage, Error> {
        // Blocks until a new frame is ready.
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;

        // Decode whatever raw format the device picked into RGB8.
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        // nokhwa may link its own `image` version; rebuild from raw bytes so the type is ours.
        let (w, h) = decoded.dimensions();
        RgbImage::from_raw(w, h, decoded.into_raw())
            .ok_or_else(|| Error::CameraFrame(format!("short RGB buffer for {w}x{h}")))
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            log::warn!("camera stop failed: {e}");
        } else {
            log::info!("camera released");
        }
    }
}
