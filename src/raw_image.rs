//! Raw image dumps
//!
//! Entries ending in `.rawimg` hold an uncompressed RGBA8 bitmap:
//!
//! ```text
//! [0..4)   unused
//! [4..8)   width  (i32, little-endian)
//! [8..12)  height (i32, little-endian)
//! [12..)   width * height * 4 bytes of RGBA, row-major, top row first
//! ```

use crate::error::{Result, TmodError};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Size of the raw image prefix before the pixel buffer
pub const RAW_IMAGE_HEADER_SIZE: usize = 12;

/// Bytes per RGBA8 pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded raw image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: i32,
    pub height: i32,
    /// RGBA8 pixels, row-major
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// RGBA value of the pixel at (`x`, `y`)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width as u32 || y >= self.height as u32 {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert into an `image` buffer
    pub fn into_rgba_image(self) -> Result<RgbaImage> {
        let (width, height) = (self.width as u32, self.height as u32);
        RgbaImage::from_raw(width, height, self.pixels).ok_or_else(|| {
            TmodError::MalformedImage(format!("Pixel buffer does not fit {}x{}", width, height))
        })
    }

    /// Encode as a PNG file image
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let image = self.clone().into_rgba_image()?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Decode a raw image payload
pub fn decode_image(data: &[u8]) -> Result<DecodedImage> {
    if data.len() < RAW_IMAGE_HEADER_SIZE {
        return Err(TmodError::MalformedImage(format!(
            "Payload is {} bytes, header needs {}",
            data.len(),
            RAW_IMAGE_HEADER_SIZE
        )));
    }

    let width = read_i32_at(data, 4);
    let height = read_i32_at(data, 8);
    if width < 0 || height < 0 {
        return Err(TmodError::MalformedImage(format!(
            "Negative dimensions {}x{}",
            width, height
        )));
    }

    let pixels = &data[RAW_IMAGE_HEADER_SIZE..];
    let expected = width as u64 * height as u64 * BYTES_PER_PIXEL as u64;
    if pixels.len() as u64 != expected {
        return Err(TmodError::MalformedImage(format!(
            "{}x{} image needs {} pixel bytes, found {}",
            width,
            height,
            expected,
            pixels.len()
        )));
    }

    Ok(DecodedImage {
        width,
        height,
        pixels: pixels.to_vec(),
    })
}

/// Build a raw image payload from RGBA8 pixels
pub fn encode_raw_image(width: i32, height: i32, pixels: &[u8]) -> Result<Vec<u8>> {
    if width < 0 || height < 0 {
        return Err(TmodError::MalformedImage(format!(
            "Negative dimensions {}x{}",
            width, height
        )));
    }
    let expected = width as u64 * height as u64 * BYTES_PER_PIXEL as u64;
    if pixels.len() as u64 != expected {
        return Err(TmodError::MalformedImage(format!(
            "{}x{} image needs {} pixel bytes, got {}",
            width,
            height,
            expected,
            pixels.len()
        )));
    }

    let mut data = Vec::with_capacity(RAW_IMAGE_HEADER_SIZE + pixels.len());
    data.extend_from_slice(&[0u8; 4]);
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(pixels);
    Ok(data)
}

fn read_i32_at(data: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    i32::from_le_bytes(buf)
}
