//! Capture loop behavior over a scripted frame source.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use image::{GrayImage, Luma};
use qrm_cli::capture::{self, CaptureReport, FrameSource, NoOverlay, Overlay};
use qrm_cli::error::QrmError;
use qrm_cli::qr::Detection;
use qrm_cli::report::{MemorySink, Reporter};

fn qr_frame(payload: &str) -> GrayImage {
    let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    code.render::<Luma<u8>>().min_dimensions(240, 240).build()
}

fn blank_frame() -> GrayImage {
    GrayImage::from_pixel(240, 240, Luma([255]))
}

struct ScriptedSource {
    frames: VecDeque<GrayImage>,
}

impl ScriptedSource {
    fn new(frames: Vec<GrayImage>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> qrm_cli::Result<Option<GrayImage>> {
        Ok(self.frames.pop_front())
    }
}

#[derive(Default)]
struct CountingOverlay {
    frames: usize,
    detections: usize,
    announcements: usize,
}

impl Overlay for CountingOverlay {
    fn frame(&mut self, _frame: &GrayImage, detection: Option<&Detection>, announce: bool) {
        self.frames += 1;
        if detection.is_some() {
            self.detections += 1;
        }
        if announce {
            self.announcements += 1;
        }
    }
}

fn reporter() -> (Reporter, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    (Reporter::new(sink.clone()), sink)
}

#[test]
fn stops_on_first_decoded_frame() {
    let mut source = ScriptedSource::new(vec![
        blank_frame(),
        blank_frame(),
        blank_frame(),
        qr_frame("42"),
        qr_frame("never reached"),
    ]);
    let mut overlay = CountingOverlay::default();
    let cancel = AtomicBool::new(false);
    let (reporter, _sink) = reporter();

    let CaptureReport {
        payload,
        frames_seen,
    } = capture::capture_until_decoded(&mut source, &mut overlay, &cancel, &reporter).unwrap();

    assert_eq!(payload, "42");
    assert_eq!(frames_seen, 4);
    assert_eq!(overlay.frames, 4);
    assert_eq!(overlay.detections, 1);
    assert_eq!(overlay.announcements, 1);
}

#[test]
fn cancellation_reports_not_found_without_pulling_frames() {
    let mut source = ScriptedSource::new(vec![qr_frame("would decode")]);
    let cancel = AtomicBool::new(true);
    let (reporter, _sink) = reporter();

    let err = capture::capture_until_decoded(&mut source, &mut NoOverlay, &cancel, &reporter)
        .unwrap_err();

    assert!(matches!(err, QrmError::QrNotFound));
    assert_eq!(source.frames.len(), 1);
}

#[test]
fn dry_source_is_a_camera_error() {
    let mut source = ScriptedSource::new(vec![blank_frame(), blank_frame()]);
    let cancel = AtomicBool::new(false);
    let (reporter, _sink) = reporter();

    let err = capture::capture_until_decoded(&mut source, &mut NoOverlay, &cancel, &reporter)
        .unwrap_err();

    assert!(matches!(err, QrmError::Camera(_)));
}

#[test]
fn narrates_camera_startup() {
    let mut source = ScriptedSource::new(vec![qr_frame("hello")]);
    let cancel = AtomicBool::new(false);
    let (reporter, sink) = reporter();

    capture::capture_until_decoded(&mut source, &mut NoOverlay, &cancel, &reporter).unwrap();

    assert_eq!(
        sink.lines(),
        vec!["Camera open. Point a QR code at it. Press Ctrl-C to cancel."]
    );
}
