//! Error types for irismatch.

use thiserror::Error;

/// Result alias for irismatch operations.
pub type IrisMatchResult<T> = std::result::Result<T, IrisMatchError>;

/// Errors that can occur across the recognition pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IrisMatchError {
    /// No plausible iris border was located in the image.
    #[error("iris not found or the eye is not fully visible")]
    IrisNotFound,
    /// The input bytes could not be decoded into an intensity image.
    #[error("invalid iris image: {reason}")]
    InvalidImage {
        /// Decoder failure description.
        reason: String,
    },
    /// The template codec failed while encoding or decoding a stored template.
    #[error("template codec failure: {reason}")]
    Codec {
        /// Codec failure description.
        reason: String,
    },
    /// A grid was constructed with a zero or overflowing dimension.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A view stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// A backing buffer is too small for the requested grid shape.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
}
