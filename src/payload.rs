//! Decoded image payloads
//!
//! An [`Image`] is only ever constructed from bytes that decode as an
//! image, so holding one means it is displayable. The original encoded
//! bytes are kept as-is; the decoded pixels are not retained.

use crate::error::{FetchError, FetchResult};
use image::{GenericImageView, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// A validated image: encoded bytes plus what decoding them revealed
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl Image {
    /// Decode `bytes`; anything that is not a complete image is a
    /// `DecodeFailure`
    pub fn decode(bytes: impl Into<Arc<[u8]>>) -> FetchResult<Self> {
        let bytes = bytes.into();
        let format = image::guess_format(&bytes)
            .map_err(|e| FetchError::DecodeFailure(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| FetchError::DecodeFailure(e.to_string()))?;
        let (width, height) = decoded.dimensions();

        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }

    /// The encoded bytes exactly as received
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height, used by hosts to size an aspect-locked view
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// Cost of holding this image in memory
    pub fn cost(&self) -> usize {
        self.bytes.len()
    }

    /// PNG encoding of this image; PNG input is returned unchanged
    pub fn to_png(&self) -> FetchResult<Vec<u8>> {
        if self.format == ImageFormat::Png {
            return Ok(self.bytes.to_vec());
        }

        let decoded = image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| FetchError::DecodeFailure(e.to_string()))?;
        let mut out = Cursor::new(Vec::new());
        decoded
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| FetchError::DecodeFailure(format!("re-encoding as png: {}", e)))?;
        Ok(out.into_inner())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Test helpers for building real encoded images
#[cfg(test)]
pub(crate) mod fixtures {
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Encode a solid `width`x`height` image in `format`
    pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]));
        let img = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ImageFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_png() {
        let img = Image::decode(fixtures::png(4, 2)).unwrap();
        assert_eq!(img.format(), ImageFormat::Png);
        assert_eq!((img.width(), img.height()), (4, 2));
        assert_eq!(img.aspect(), 2.0);
    }

    #[test]
    fn decode_keeps_bytes_exactly() {
        let bytes = fixtures::png(3, 3);
        let img = Image::decode(bytes.clone()).unwrap();
        assert_eq!(img.bytes(), bytes.as_slice());
        assert_eq!(img.cost(), bytes.len());
    }

    #[test]
    fn html_is_not_an_image() {
        let err = Image::decode(b"<html><body>404</body></html>".to_vec()).unwrap_err();
        assert!(matches!(err, FetchError::DecodeFailure(_)));
    }

    #[test]
    fn truncated_png_fails() {
        let mut bytes = fixtures::png(16, 16);
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(
            Image::decode(bytes).unwrap_err(),
            FetchError::DecodeFailure(_)
        ));
    }

    #[test]
    fn jpeg_reencodes_to_png() {
        let img = Image::decode(fixtures::encoded(5, 7, ImageFormat::Jpeg)).unwrap();
        assert_eq!(img.format(), ImageFormat::Jpeg);

        let png = Image::decode(img.to_png().unwrap()).unwrap();
        assert_eq!(png.format(), ImageFormat::Png);
        assert_eq!((png.width(), png.height()), (5, 7));
    }
}
