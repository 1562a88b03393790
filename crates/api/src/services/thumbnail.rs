//! Thumbnail normalization.
//!
//! Uploads are scaled to fit a square canvas with the aspect ratio kept,
//! centered on a transparent background, and re-encoded as PNG.

use image::{imageops, imageops::FilterType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const THUMBNAIL_CONTENT_TYPE: &str = "image/png";

/// Decodes `bytes`, fits the image into `size`×`size` and encodes a PNG.
pub fn make_thumbnail(bytes: &[u8], size: u32) -> Result<Vec<u8>, image::ImageError> {
    let source = image::load_from_memory(bytes)?;
    let resized = source.resize(size, size, FilterType::Lanczos3).to_rgba8();

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    let x = (size - resized.width()) / 2;
    let y = (size - resized.height()) / 2;
    imageops::overlay(&mut canvas, &resized, i64::from(x), i64::from(y));

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_image_is_letterboxed() {
        let png = make_thumbnail(&sample_png(300, 100), 150).unwrap();
        let thumb = image::load_from_memory(&png).unwrap().to_rgba8();

        assert_eq!(thumb.dimensions(), (150, 150));
        // 300x100 scales to 150x50, centered vertically.
        assert_eq!(thumb.get_pixel(75, 0)[3], 0);
        assert_eq!(thumb.get_pixel(75, 75)[3], 255);
        assert_eq!(thumb.get_pixel(75, 149)[3], 0);
    }

    #[test]
    fn test_small_image_is_scaled_up() {
        let png = make_thumbnail(&sample_png(10, 10), 150).unwrap();
        let thumb = image::load_from_memory(&png).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (150, 150));
        assert_eq!(thumb.to_rgba8().get_pixel(75, 75)[3], 255);
    }

    #[test]
    fn test_rejects_non_image() {
        assert!(make_thumbnail(b"definitely not an image", 150).is_err());
    }
}
