use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use tracing::debug;

use super::model::FragmentImage;

/// Longest edge of the inline thumbnail, in pixels.
pub const THUMBNAIL_EDGE: u32 = 96;

pub fn load_image(path: &Path) -> Result<FragmentImage> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    image_from_bytes(&bytes).with_context(|| format!("in {}", path.display()))
}

/// Keeps the original bytes for the analysis service and a small PNG data URL
/// for drawing.
pub fn image_from_bytes(bytes: &[u8]) -> Result<FragmentImage> {
    let format = image::guess_format(bytes).context("unrecognised image format")?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .context("failed to decode image")?;

    let thumbnail = decoded.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
    let mut png = Vec::new();
    thumbnail
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode thumbnail")?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        thumbnail_bytes = png.len(),
        "image attached"
    );

    Ok(FragmentImage {
        base64: STANDARD.encode(bytes),
        mime_type: format.to_mime_type().to_owned(),
        thumbnail: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
        reading: None,
    })
}

/// Bytes behind a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (header, payload) = url.strip_prefix("data:")?.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_original_bytes_and_a_small_thumbnail() {
        let png = sample_png(320, 160);
        let image = image_from_bytes(&png).unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&image.base64).unwrap(), png);
        assert!(image.reading.is_none());

        let thumbnail = decode_data_url(&image.thumbnail).unwrap();
        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_EDGE);
        assert_eq!(decoded.height(), THUMBNAIL_EDGE / 2);
    }

    #[test]
    fn rejects_what_is_not_an_image() {
        assert!(image_from_bytes(b"plain words").is_err());
        assert!(load_image(Path::new("/nonexistent/picture.png")).is_err());
    }

    #[test]
    fn data_urls_need_a_base64_payload() {
        assert_eq!(decode_data_url("data:text/plain;base64,aGk="), Some(b"hi".to_vec()));
        assert_eq!(decode_data_url("data:text/plain,hi"), None);
        assert_eq!(decode_data_url("https://example.com/a.png"), None);
    }
}
