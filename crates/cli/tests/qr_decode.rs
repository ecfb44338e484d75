//! File decoding against synthesized QR images.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, Luma};
use qrm_cli::error::QrmError;
use qrm_cli::qr;

fn qr_image(payload: &str) -> GrayImage {
    let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    code.render::<Luma<u8>>().min_dimensions(240, 240).build()
}

fn save_png(image: &GrayImage, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

#[test]
fn decodes_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_png(&qr_image("https://example.com/png"), dir.path(), "code.png");

    assert_eq!(qr::decode_file(&path).unwrap(), "https://example.com/png");
}

#[test]
fn decodes_bmp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("code.bmp");
    qr_image("bmp payload").save(&path).unwrap();

    assert_eq!(qr::decode_file(&path).unwrap(), "bmp payload");
}

#[test]
fn decodes_jpeg_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("code.jpg");
    let image = qr_image("jpeg payload");

    // High quality so compression artifacts do not eat the modules.
    let file = File::create(&path).unwrap();
    let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), 95);
    encoder.encode_image(&image).unwrap();

    assert_eq!(qr::decode_file(&path).unwrap(), "jpeg payload");
}

#[test]
fn decodes_gif_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("code.gif");
    let rgba = DynamicImage::ImageLuma8(qr_image("gif payload")).to_rgba8();
    rgba.save(&path).unwrap();

    assert_eq!(qr::decode_file(&path).unwrap(), "gif payload");
}

#[test]
fn blank_image_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let blank = GrayImage::from_pixel(240, 240, Luma([255]));
    let path = save_png(&blank, dir.path(), "blank.png");

    assert!(matches!(
        qr::decode_file(&path),
        Err(QrmError::QrNotFound)
    ));
}

#[test]
fn corrupt_file_reports_invalid_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.png");
    let mut file = File::create(&path).unwrap();
    file.write_all(b"this is not an image at all").unwrap();
    drop(file);

    assert!(matches!(
        qr::decode_file(&path),
        Err(QrmError::InvalidImage { .. })
    ));
}

#[test]
fn missing_file_reports_invalid_image() {
    let path = Path::new("/nonexistent/definitely-missing.png");

    assert!(matches!(
        qr::decode_file(path),
        Err(QrmError::InvalidImage { .. })
    ));
}

#[test]
fn multiple_codes_decode_to_one_payload() {
    let first = qr_image("first code");
    let second = qr_image("second code");

    // Both codes side by side on one canvas with a gap between them.
    let gap = 40;
    let width = first.width() + gap + second.width();
    let height = first.height().max(second.height());
    let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
    image::imageops::overlay(&mut canvas, &first, 0, 0);
    image::imageops::overlay(&mut canvas, &second, (first.width() + gap) as i64, 0);

    let payload = qr::decode_image(&canvas).unwrap();
    assert!(payload == "first code" || payload == "second code");
}
