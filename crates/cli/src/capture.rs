//! Live capture loop.
//!
//! Pulls frames from a [`FrameSource`] until one of them decodes, the
//! cancel flag is raised, or the source dries up. Every frame passes
//! through an [`Overlay`] so a front end can draw detection feedback.

use std::sync::atomic::{AtomicBool, Ordering};

use image::GrayImage;
use tracing::{debug, info};

use crate::error::{QrmError, Result};
use crate::qr::{self, Detection};
use crate::report::Reporter;

/// Produces grayscale frames, typically from a camera.
pub trait FrameSource {
    /// The next frame, or `None` once the source stops producing.
    fn next_frame(&mut self) -> Result<Option<GrayImage>>;
}

/// Receives every captured frame together with any detection made on
/// it. `announce` is true the first time a payload differs from the
/// previously seen one.
pub trait Overlay: Send {
    fn frame(&mut self, frame: &GrayImage, detection: Option<&Detection>, announce: bool);
}

/// Overlay that draws nothing.
pub struct NoOverlay;

impl Overlay for NoOverlay {
    fn frame(&mut self, _frame: &GrayImage, _detection: Option<&Detection>, _announce: bool) {}
}

#[derive(Debug)]
pub struct CaptureReport {
    pub payload: String,
    /// Frames pulled from the source, the decoded one included.
    pub frames_seen: usize,
}

/// Runs the capture loop to completion.
///
/// The cancel flag is checked once per iteration, before the next frame
/// is pulled. Cancellation surfaces as [`QrmError::QrNotFound`]; a
/// source that stops producing is a camera failure.
pub fn capture_until_decoded(
    source: &mut dyn FrameSource,
    overlay: &mut dyn Overlay,
    cancel: &AtomicBool,
    reporter: &Reporter,
) -> Result<CaptureReport> {
    reporter.say("Camera open. Point a QR code at it. Press Ctrl-C to cancel.");

    let mut frames_seen = 0usize;
    let mut last_payload: Option<String> = None;

    loop {
        if cancel.load(Ordering::Relaxed) {
            debug!(target: "qrm::capture", frames_seen, "capture cancelled");
            return Err(QrmError::QrNotFound);
        }

        let Some(frame) = source.next_frame()? else {
            return Err(QrmError::Camera(
                "camera stopped producing frames".to_string(),
            ));
        };
        frames_seen += 1;

        let detection = qr::detect(&frame);
        let announce = match &detection {
            Some(detection) => last_payload.as_deref() != Some(detection.payload.as_str()),
            None => false,
        };
        overlay.frame(&frame, detection.as_ref(), announce);

        if let Some(detection) = detection {
            if announce {
                last_payload = Some(detection.payload.clone());
            }
            info!(target: "qrm::capture", frames_seen, "payload decoded");
            return Ok(CaptureReport {
                payload: detection.payload,
                frames_seen,
            });
        }
    }
}
