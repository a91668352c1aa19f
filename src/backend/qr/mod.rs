//! QR images: rendering payload text and finding WiFi payloads in pictures.
//!
//! Encoding goes through `qrcode`, decoding through `rqrr`. Both work on
//! greyscale `image` buffers so camera frames and files share one path.

pub mod camera;

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use super::error::{Error, Result};
use super::payload::{parse_payload, QrPayload};

/// Blank modules around the symbol, as the QR standard requires
const QUIET_ZONE: u32 = 4;

const BLUR_SIGMA: f32 = 1.0;
const CONTRAST_BOOST: f32 = 40.0;

/// Image clean-ups tried in order until something decodes.
#[derive(Debug, Clone, Copy)]
enum Pass {
    Original,
    Blur,
    Contrast,
    Threshold,
    Rescale(f32),
}

const FILE_PASSES: [Pass; 7] = [
    Pass::Original,
    Pass::Blur,
    Pass::Contrast,
    Pass::Threshold,
    Pass::Rescale(0.5),
    Pass::Rescale(1.5),
    Pass::Rescale(2.0),
];

/// Frames keep coming, so each one only gets the cheap passes.
const FRAME_PASSES: [Pass; 2] = [Pass::Original, Pass::Blur];

impl Pass {
    fn apply(self, image: &GrayImage) -> Cow<'_, GrayImage> {
        match self {
            Pass::Original => Cow::Borrowed(image),
            Pass::Blur => Cow::Owned(imageops::blur(image, BLUR_SIGMA)),
            Pass::Contrast => Cow::Owned(imageops::contrast(image, CONTRAST_BOOST)),
            Pass::Threshold => Cow::Owned(threshold(image)),
            Pass::Rescale(factor) => {
                let width = ((image.width() as f32 * factor) as u32).max(1);
                let height = ((image.height() as f32 * factor) as u32).max(1);
                Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
            }
        }
    }
}

/// Binarize around the mean brightness.
fn threshold(image: &GrayImage) -> GrayImage {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return image.clone();
    }
    let mean = pixels.iter().map(|&p| p as u64).sum::<u64>() / pixels.len() as u64;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] as u64 > mean { 255 } else { 0 };
    }
    out
}

/// Render `text` as a black-on-white QR code, `scale` pixels per module.
pub fn encode(text: &str, scale: u32) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)?;
    let width = code.width() as u32;
    let colors = code.to_colors();
    let scale = scale.max(1);
    let size = (width + 2 * QUIET_ZONE) * scale;

    Ok(GrayImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / scale, y / scale);
        let inside = (QUIET_ZONE..QUIET_ZONE + width).contains(&mx)
            && (QUIET_ZONE..QUIET_ZONE + width).contains(&my);
        let dark = inside
            && matches!(
                colors[((my - QUIET_ZONE) * width + (mx - QUIET_ZONE)) as usize],
                Color::Dark
            );
        if dark {
            Luma([0])
        } else {
            Luma([255])
        }
    }))
}

pub fn render_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Text of every QR code rqrr can read in `image`.
pub fn decode_texts(image: &GrayImage) -> Vec<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32).0[0],
    );
    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| match grid.decode() {
            Ok((_meta, content)) => Some(content),
            Err(e) => {
                tracing::debug!("QR grid found but not decodable: {}", e);
                None
            }
        })
        .collect()
}

/// Find a WiFi payload in a still image, trying every clean-up pass.
///
/// Codes that decode but aren't WiFi payloads don't stop the search. If none
/// parse, the first parse error is returned, or `QrNotFound` if nothing
/// decoded at all.
pub fn scan_image(image: &GrayImage) -> Result<QrPayload> {
    scan_with(image, &FILE_PASSES)
}

/// One stateless decode attempt on a camera frame.
pub fn scan_frame(frame: &GrayImage) -> Option<QrPayload> {
    scan_with(frame, &FRAME_PASSES).ok()
}

fn scan_with(image: &GrayImage, passes: &[Pass]) -> Result<QrPayload> {
    let mut first_error = None;
    for pass in passes {
        let candidate = pass.apply(image);
        for text in decode_texts(&candidate) {
            match parse_payload(&text) {
                Ok(payload) => {
                    tracing::debug!("Found WiFi QR code ({:?} pass)", pass);
                    return Ok(payload);
                }
                Err(e) => {
                    tracing::debug!("Skipping QR code that is not a WiFi payload: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
    }
    Err(first_error.unwrap_or(Error::QrNotFound))
}

/// Scan an image file, or parse a `.txt` file holding payload text.
pub fn scan_file(path: &Path) -> Result<QrPayload> {
    let is_text = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_text {
        let text = std::fs::read_to_string(path)?;
        return parse_payload(text.trim());
    }

    let image = image::open(path)?.to_luma8();
    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    scan_image(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::payload::QrSecurity;

    const HOME: &str = r"WIFI:T:WPA;S:Home\;Net;P:hunter22;;";

    #[test]
    fn encoded_code_scans_back() {
        let image = encode(HOME, 4).unwrap();
        let payload = scan_image(&image).unwrap();
        assert_eq!(payload.ssid, "Home;Net");
        assert_eq!(payload.security, QrSecurity::Wpa);
        assert_eq!(payload.password, "hunter22");
    }

    #[test]
    fn encoded_image_has_quiet_zone() {
        let image = encode(HOME, 3).unwrap();
        assert_eq!(image.width(), image.height());
        assert_eq!(image.get_pixel(0, 0).0[0], 255);
        assert_eq!(image.get_pixel(QUIET_ZONE * 3, QUIET_ZONE * 3).0[0], 0);
    }

    #[test]
    fn frame_scan_is_stateless() {
        let frame = encode(HOME, 4).unwrap();
        assert!(scan_frame(&frame).is_some());
        assert!(scan_frame(&GrayImage::from_pixel(64, 48, Luma([255]))).is_none());
        assert!(scan_frame(&frame).is_some());
    }

    #[test]
    fn decode_returns_raw_text() {
        let image = encode("hello", 4).unwrap();
        assert_eq!(decode_texts(&image), ["hello"]);
        assert!(decode_texts(&GrayImage::from_pixel(40, 40, Luma([255]))).is_empty());
    }

    #[test]
    fn blank_image_has_no_code() {
        let blank = GrayImage::from_pixel(120, 120, Luma([255]));
        assert!(matches!(scan_image(&blank), Err(Error::QrNotFound)));
    }

    #[test]
    fn non_wifi_code_reports_parse_error() {
        let image = encode("https://example.com", 4).unwrap();
        assert!(matches!(scan_image(&image), Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn png_output_loads_back() {
        let image = encode(HOME, 2).unwrap();
        let png = render_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let loaded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), image.dimensions());
    }

    #[test]
    fn scans_png_and_text_files() {
        let dir = tempfile::tempdir().unwrap();

        let png_path = dir.path().join("home.png");
        encode(HOME, 4).unwrap().save(&png_path).unwrap();
        assert_eq!(scan_file(&png_path).unwrap().ssid, "Home;Net");

        let txt_path = dir.path().join("home.TXT");
        std::fs::write(&txt_path, format!("{HOME}\n")).unwrap();
        assert_eq!(scan_file(&txt_path).unwrap().password, "hunter22");
    }

    #[test]
    fn threshold_splits_on_mean() {
        let mut image = GrayImage::from_pixel(2, 1, Luma([10]));
        image.put_pixel(1, 0, Luma([200]));
        let out = threshold(&image);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }
}
