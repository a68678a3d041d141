//! Bitmap decoding into firmware pixel formats.
//!
//! Source images are decoded with the `image` crate and converted to either
//! RGB565 (16 bpp, two bytes per pixel, stored low byte first) or BGRA8888
//! (32 bpp). Decode failures are fatal: a build with a missing or corrupt
//! image has nothing sensible to emit.

use std::path::Path;

use anyhow::Context as _;

use crate::error::{BuildError, BuildResult};
use crate::model::Bitmap;

#[derive(Clone, Debug)]
pub struct BitmapData {
    pub width: u16,
    pub height: u16,
    /// 16 or 32.
    pub bpp: u8,
    pub pixels: Vec<u8>,
}

/// Loads and converts the bitmap's source image from disk, resolving its
/// relative path against `project_dir`.
pub fn load_bitmap(bitmap: &Bitmap, project_dir: &Path) -> BuildResult<BitmapData> {
    let path = project_dir.join(&bitmap.source);
    let bytes = std::fs::read(&path)
        .with_context(|| format!("failed to read bitmap source {}", path.display()))?;
    decode_bitmap(bitmap, &bytes)
}

/// Decodes an in-memory source image into the bitmap's target pixel format.
pub fn decode_bitmap(bitmap: &Bitmap, bytes: &[u8]) -> BuildResult<BitmapData> {
    let image = image::load_from_memory(bytes)
        .with_context(|| format!("failed to decode bitmap {}", bitmap.name))?
        .to_rgba8();

    let (width, height) = image.dimensions();
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(BuildError::validation(format!(
            "bitmap {} is too large: {width}x{height}",
            bitmap.name
        )));
    }

    let mut pixels = Vec::with_capacity(match bitmap.bpp {
        32 => (width * height * 4) as usize,
        _ => (width * height * 2) as usize,
    });

    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        if bitmap.bpp == 32 {
            pixels.extend_from_slice(&[b, g, r, a]);
        } else {
            // RGB565, low byte first.
            pixels.push(((g & 28) << 3) | (b >> 3));
            pixels.push((r & 248) | (g >> 5));
        }
    }

    Ok(BitmapData {
        width: width as u16,
        height: height as u16,
        bpp: if bitmap.bpp == 32 { 32 } else { 16 },
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(bpp: u8) -> Bitmap {
        Bitmap {
            name: "b".to_string(),
            source: "b.png".to_string(),
            bpp,
            always_build: false,
        }
    }

    fn png_1x1(r: u8, g: u8, b: u8, a: u8) -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([r, g, b, a]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn bgra_order_at_32_bpp() {
        let data = decode_bitmap(&bitmap(32), &png_1x1(10, 20, 30, 40)).unwrap();
        assert_eq!(data.bpp, 32);
        assert_eq!(data.pixels, vec![30, 20, 10, 40]);
        assert_eq!((data.width, data.height), (1, 1));
    }

    #[test]
    fn rgb565_packing_at_16_bpp() {
        // Pure red and pure blue land in opposite bytes.
        let red = decode_bitmap(&bitmap(16), &png_1x1(255, 0, 0, 255)).unwrap();
        assert_eq!(red.pixels, vec![0x00, 0xf8]);

        let blue = decode_bitmap(&bitmap(16), &png_1x1(0, 0, 255, 255)).unwrap();
        assert_eq!(blue.pixels, vec![0x1f, 0x00]);
    }

    #[test]
    fn corrupt_image_is_a_fatal_error() {
        assert!(decode_bitmap(&bitmap(16), &[1, 2, 3]).is_err());
    }
}
