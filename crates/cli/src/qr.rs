//! QR detection and decoding over grayscale frames.

use std::path::Path;

use image::GrayImage;
use tracing::debug;

use crate::error::{QrmError, Result};

/// One decoded code with the corner points of its grid, in pixel
/// coordinates.
#[derive(Debug, Clone)]
pub struct Detection {
    pub payload: String,
    pub bounds: [(i32, i32); 4],
}

/// Finds the first decodable code in `frame`.
///
/// The first grid found is the primary candidate; the remaining grids
/// cover images carrying several codes. The first non-empty payload
/// wins, in detection order.
pub fn detect(frame: &GrayImage) -> Option<Detection> {
    let mut prepared = rqrr::PreparedImage::prepare(frame.clone());
    let grids = prepared.detect_grids();

    for grid in grids {
        match grid.decode() {
            Ok((_, payload)) if !payload.is_empty() => {
                let corners = grid.bounds;
                let bounds = [
                    (corners[0].x as i32, corners[0].y as i32),
                    (corners[1].x as i32, corners[1].y as i32),
                    (corners[2].x as i32, corners[2].y as i32),
                    (corners[3].x as i32, corners[3].y as i32),
                ];
                return Some(Detection { payload, bounds });
            }
            Ok(_) => {}
            Err(e) => debug!(target: "qrm::qr", error = %e, "grid did not decode"),
        }
    }
    None
}

/// Decodes a single payload from an in-memory frame.
pub fn decode_image(frame: &GrayImage) -> Result<String> {
    detect(frame)
        .map(|detection| detection.payload)
        .ok_or(QrmError::QrNotFound)
}

/// Loads an image file and decodes a QR payload from it.
///
/// Any format the image decoder understands is accepted; the file is
/// converted to grayscale before detection.
pub fn decode_file(path: &Path) -> Result<String> {
    let image = image::open(path).map_err(|source| QrmError::InvalidImage {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        target: "qrm::qr",
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "image loaded"
    );
    decode_image(&image.to_luma8())
}
