//! Intensity images: borrowed views and owned buffers.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. `OwnedImage` is the
//! contiguous owned counterpart produced by decoding and preprocessing; every
//! pipeline stage consumes views so callers keep ownership of their pixels.

use crate::util::{IrisMatchError, IrisMatchResult};

pub mod pyramid;

#[cfg(feature = "image-io")]
pub mod io;

/// Borrowed 2D single-channel view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> IrisMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> IrisMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(IrisMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

impl<'a> ImageView<'a, u8> {
    /// Samples the pixel at integer coordinates clamped to the image bounds.
    ///
    /// The polar mappings in localization and normalization can produce
    /// coordinates outside the image for degenerate borders; the clamp policy
    /// keeps those lookups total.
    pub fn sample_clamped(&self, x: i64, y: i64) -> u8 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[cy * self.stride + cx]
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> IrisMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(IrisMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(IrisMatchError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(IrisMatchError::InvalidDimensions { width, height })?;
    Ok(needed)
}

/// Owned contiguous single-channel image buffer.
#[derive(Clone)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Creates an owned image from an exactly-sized contiguous buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> IrisMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(IrisMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(IrisMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(IrisMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(IrisMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn from_view(view: ImageView<'_, u8>) -> IrisMatchResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(IrisMatchError::BufferTooSmall {
                needed: width * height,
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the contiguous pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageView, OwnedImage};
    use crate::util::IrisMatchError;

    #[test]
    fn view_rejects_invalid_dimensions() {
        let data = [0u8; 4];
        let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
        assert_eq!(
            err,
            IrisMatchError::InvalidDimensions {
                width: 0,
                height: 1
            }
        );
    }

    #[test]
    fn view_rejects_invalid_stride() {
        let data = [0u8; 8];
        let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
        assert_eq!(
            err,
            IrisMatchError::InvalidStride {
                width: 4,
                stride: 3
            }
        );
    }

    #[test]
    fn view_rejects_small_buffer() {
        let data = [0u8; 3];
        let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
        assert_eq!(err, IrisMatchError::BufferTooSmall { needed: 4, got: 3 });
    }

    #[test]
    fn sample_clamped_clamps_to_edges() {
        let data: Vec<u8> = (0u8..16).collect();
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        assert_eq!(view.sample_clamped(-5, -5), 0);
        assert_eq!(view.sample_clamped(10, 1), 7);
        assert_eq!(view.sample_clamped(3, 10), 15);
    }

    #[test]
    fn owned_image_round_trips_view() {
        let data: Vec<u8> = (0u8..12).collect();
        let img = OwnedImage::new(data.clone(), 4, 3).unwrap();
        assert_eq!(img.view().row(1).unwrap(), &data[4..8]);
        assert_eq!(img.data(), data.as_slice());
    }
}
