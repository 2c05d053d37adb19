//! Image pyramid construction for grayscale `u8` images.
//!
//! Downsampling uses a 2x2 box filter with integer rounding:
//! `dst = ((a + b + c + d) + 2) / 4`. The keypoint comparator detects on every
//! level to gain scale tolerance without a full scale-space.

use crate::image::{ImageView, OwnedImage};
use crate::util::{IrisMatchError, IrisMatchResult};

/// Owned image pyramid built from a base level.
pub struct ImagePyramid {
    levels: Vec<OwnedImage>,
}

impl ImagePyramid {
    /// Builds a pyramid from a base grayscale view.
    ///
    /// `max_levels` is clamped to at least 1 so the base level is always
    /// present; halving stops once a side would drop below 2 pixels.
    pub fn build_u8(base: ImageView<'_, u8>, max_levels: usize) -> IrisMatchResult<Self> {
        let max_levels = max_levels.max(1);
        let mut levels = Vec::new();
        levels.push(OwnedImage::from_view(base)?);

        while levels.len() < max_levels {
            let prev = levels.last().expect("levels is not empty");
            let src = prev.view();
            if src.width() < 2 || src.height() < 2 {
                break;
            }

            let dst_width = src.width() / 2;
            let dst_height = src.height() / 2;
            let dst_len =
                dst_width
                    .checked_mul(dst_height)
                    .ok_or(IrisMatchError::InvalidDimensions {
                        width: dst_width,
                        height: dst_height,
                    })?;
            let mut dst = vec![0u8; dst_len];

            for y in 0..dst_height {
                let row0 = src.row(y * 2).expect("source row in bounds");
                let row1 = src.row(y * 2 + 1).expect("source row in bounds");
                for x in 0..dst_width {
                    let sum = u16::from(row0[2 * x])
                        + u16::from(row0[2 * x + 1])
                        + u16::from(row1[2 * x])
                        + u16::from(row1[2 * x + 1]);
                    dst[y * dst_width + x] = ((sum + 2) / 4) as u8;
                }
            }

            levels.push(OwnedImage::new(dst, dst_width, dst_height)?);
        }

        Ok(Self { levels })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[OwnedImage] {
        &self.levels
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.levels.get(index).map(|level| level.view())
    }
}

#[cfg(test)]
mod tests {
    use super::ImagePyramid;
    use crate::image::ImageView;

    #[test]
    fn pyramid_halves_dimensions_per_level() {
        let data = vec![128u8; 64 * 48];
        let view = ImageView::from_slice(&data, 64, 48).unwrap();
        let pyr = ImagePyramid::build_u8(view, 3).unwrap();
        assert_eq!(pyr.levels().len(), 3);
        assert_eq!(pyr.level(1).unwrap().width(), 32);
        assert_eq!(pyr.level(2).unwrap().height(), 12);
    }

    #[test]
    fn pyramid_stops_before_degenerate_level() {
        let data = vec![0u8; 3 * 2];
        let view = ImageView::from_slice(&data, 3, 2).unwrap();
        let pyr = ImagePyramid::build_u8(view, 5).unwrap();
        assert_eq!(pyr.levels().len(), 2);
        assert_eq!(pyr.level(1).unwrap().width(), 1);
    }

    #[test]
    fn box_filter_averages_quads() {
        let data = vec![10u8, 20, 30, 40];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let pyr = ImagePyramid::build_u8(view, 2).unwrap();
        assert_eq!(pyr.level(1).unwrap().get(0, 0).copied(), Some(25));
    }
}
