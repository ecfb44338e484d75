//! Webcam frame source backed by nokhwa.

use image::GrayImage;
use nokhwa::Camera;
use nokhwa::pixel_format::LumaFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use tracing::{debug, warn};

use crate::capture::FrameSource;
use crate::error::{QrmError, Result};

pub struct CameraSource {
    camera: Camera,
    index: u32,
}

impl CameraSource {
    /// Opens camera `index` and starts its stream.
    pub fn open(index: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<LumaFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| QrmError::Camera(format!("could not open camera {index}: {e}")))?;
        camera
            .open_stream()
            .map_err(|e| QrmError::Camera(format!("could not start camera {index} stream: {e}")))?;
        debug!(target: "qrm::camera", index, "camera stream open");
        Ok(Self { camera, index })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<GrayImage>> {
        match self.camera.frame() {
            Ok(buffer) => {
                let frame = buffer.decode_image::<LumaFormat>().map_err(|e| {
                    QrmError::Camera(format!("could not decode camera frame: {e}"))
                })?;
                Ok(Some(frame))
            }
            Err(e) => {
                warn!(target: "qrm::camera", index = self.index, error = %e, "frame grab failed");
                Ok(None)
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            debug!(target: "qrm::camera", index = self.index, error = %e, "stream stop failed");
        }
    }
}
