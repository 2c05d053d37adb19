//! Decoding encoded still images into intensity matrices.
//!
//! Available when the `image-io` feature is enabled. Malformed input surfaces
//! as [`IrisMatchError::InvalidImage`]; color input is converted to luma.

use crate::image::OwnedImage;
use crate::util::{IrisMatchError, IrisMatchResult};
use std::path::Path;

/// Decodes encoded image bytes (PNG/JPEG) into a grayscale intensity image.
pub fn decode_intensity(bytes: &[u8]) -> IrisMatchResult<OwnedImage> {
    let decoded = image::load_from_memory(bytes).map_err(|err| IrisMatchError::InvalidImage {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&decoded)
}

/// Creates an owned image from a grayscale image buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> IrisMatchResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedImage::new(img.as_raw().clone(), width, height)
}

/// Creates an owned grayscale image from a dynamic image.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> IrisMatchResult<OwnedImage> {
    let gray = img.to_luma8();
    owned_from_gray_image(&gray)
}

/// Loads an image from disk and converts it to a grayscale owned image.
pub fn load_intensity<P: AsRef<Path>>(path: P) -> IrisMatchResult<OwnedImage> {
    let img = image::open(path).map_err(|err| IrisMatchError::InvalidImage {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

#[cfg(test)]
mod tests {
    use super::decode_intensity;
    use crate::util::IrisMatchError;

    #[test]
    fn garbage_bytes_are_invalid_image() {
        let err = decode_intensity(&[0u8, 1, 2, 3]).err().unwrap();
        assert!(matches!(err, IrisMatchError::InvalidImage { .. }));
    }
}
