//! Sprite image loading.
//!
//! Decodes the optional sprite drawn by sprite particles into RGBA pixels
//! the GPU presenter can upload.
//!
//! # Supported Formats
//!
//! - PNG (recommended)
//! - JPEG

use crate::error::SpriteError;
use std::path::Path;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SpriteImage {
    /// Wrap raw RGBA data, checking it matches the dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, SpriteError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(SpriteError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Decode an encoded image held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpriteError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Load and decode an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SpriteError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let sprite = Self::from_bytes(&bytes)?;
        log::info!(
            "loaded sprite '{}' ({}x{})",
            path.display(),
            sprite.width,
            sprite.height
        );
        Ok(sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_rgba_checks_size() {
        assert!(SpriteImage::from_rgba(vec![0; 16], 2, 2).is_ok());
        let err = SpriteImage::from_rgba(vec![0; 12], 2, 2).unwrap_err();
        assert!(matches!(err, SpriteError::SizeMismatch { expected: 16, actual: 12 }));
    }

    #[test]
    fn test_decode_png() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let sprite = SpriteImage::from_bytes(&png).unwrap();
        assert_eq!((sprite.width, sprite.height), (3, 2));
        assert_eq!(sprite.data.len(), 3 * 2 * 4);
        assert_eq!(&sprite.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = SpriteImage::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, SpriteError::ImageLoad(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SpriteImage::from_file("/no/such/sprite.png").unwrap_err();
        assert!(matches!(err, SpriteError::Io(_)));
    }
}
