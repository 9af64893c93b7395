//! Capture device abstraction
//!
//! The capture device is a collaborator behind a seam: the producer only
//! needs "open once, read frames, release on drop". The nokhwa backend is
//! the production implementation; tests script their own.

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use thiserror::Error;

use crate::capture::frame::Frame;
use crate::config::CameraConfig;

/// Capture failures
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("frame read failed: {0}")]
    ReadFailed(String),
}

/// An open capture device handle
pub trait CaptureDevice: Send {
    /// Read the next frame, converted to RGBA
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Opens capture devices
pub trait CaptureBackend: Send + Sync {
    fn open(&self, config: &CameraConfig) -> Result<Box<dyn CaptureDevice>, CaptureError>;
}

/// Webcam backend using nokhwa
pub struct NokhwaBackend;

impl CaptureBackend for NokhwaBackend {
    fn open(&self, config: &CameraConfig) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let format =
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(CameraIndex::Index(config.source), format)
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let camera_format = camera.camera_format();
        tracing::info!(
            "Camera {} opened: {}x{} @ {}fps (requested {}x{} @ {}fps)",
            config.source,
            camera_format.resolution().width(),
            camera_format.resolution().height(),
            camera_format.frame_rate(),
            config.width,
            config.height,
            config.fps
        );

        Ok(Box::new(NokhwaDevice { camera }))
    }
}

struct NokhwaDevice {
    camera: Camera,
}

impl CaptureDevice for NokhwaDevice {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;

        let decoded = buffer
            .decode_image::<RgbAFormat>()
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;

        let (width, height) = decoded.dimensions();
        Ok(Frame::new(width, height, decoded.into_raw()))
    }
}

impl Drop for NokhwaDevice {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Error stopping camera stream: {:?}", e);
        }
    }
}
