//! Integrodifferential border search.
//!
//! The inner border is found by seeding a center from the binarized pupil
//! mass, then maximizing the derivative-of-Gaussian response of perimeter
//! sums over candidate circles. The outer border repeats the search around
//! the inner center with per-image derived parameters.

use crate::image::{ImageView, OwnedImage};
use crate::localize::prep::{binarize, binarize_inv};
use crate::localize::{derive_outer_search, Border, IrisBorders, Localize, SearchParams};
use crate::trace::{trace_event, trace_span};
use crate::util::{IrisMatchError, IrisMatchResult};

const GAUSS_SIGMA: f64 = 3.0;
/// Truncation of the Gaussian derivative window: three sigma, in samples.
const GAUSS_REACH: i32 = 9;

/// Configuration for the integrodifferential search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegroConfig {
    /// Shared radius/threshold/margin bounds.
    pub search: SearchParams,
    /// Half-size of the center refinement window around the seeded center.
    pub search_area: i32,
    /// Half-size of the outer-border center window around the inner center.
    pub outer_search_area: i32,
}

impl Default for IntegroConfig {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            search_area: 2,
            outer_search_area: 3,
        }
    }
}

/// Integrodifferential localizer.
pub struct IntegroLocalizer {
    config: IntegroConfig,
}

impl IntegroLocalizer {
    /// Creates a localizer with the given configuration.
    pub fn new(config: IntegroConfig) -> Self {
        Self { config }
    }
}

impl Localize for IntegroLocalizer {
    fn localize(&self, image: ImageView<'_, u8>) -> IrisMatchResult<IrisBorders> {
        let _guard = trace_span!("integro_localize").entered();
        let params = &self.config.search;

        let dark = binarize_inv(image, params.threshold);
        let (seed_x, seed_y) = seed_center(&dark, params.edge_margin)?;
        trace_event!("integro_seed", x = seed_x, y = seed_y);

        let bright = binarize(image, params.threshold);
        let inner = peak_response(
            &bright,
            seed_x,
            seed_y,
            self.config.search_area,
            params.min_radius,
            params.max_radius,
        )?;
        trace_event!("inner_border", x = inner.x, y = inner.y, r = inner.r);

        let outer_search = derive_outer_search(image, &inner);
        let bright_outer = binarize(image, outer_search.threshold);
        let outer = peak_response(
            &bright_outer,
            inner.x,
            inner.y,
            self.config.outer_search_area,
            outer_search.min_radius,
            outer_search.max_radius,
        )?;
        trace_event!("outer_border", x = outer.x, y = outer.y, r = outer.r);

        Ok(IrisBorders::new(inner, outer))
    }
}

/// Seeds the search from the row and column with maximal binarized pupil
/// mass, both restricted to the margin-respecting range.
fn seed_center(dark: &OwnedImage, margin: i32) -> IrisMatchResult<(i32, i32)> {
    let view = dark.view();
    let (w, h) = (view.width() as i32, view.height() as i32);

    let mut best_row_sum = 0u32;
    let mut seed_y = None;
    for y in margin.max(0)..(h - margin).max(0) {
        let sum = view
            .row(y as usize)
            .expect("row in bounds")
            .iter()
            .map(|&v| u32::from(v != 0))
            .sum();
        if sum > best_row_sum {
            best_row_sum = sum;
            seed_y = Some(y);
        }
    }

    let mut best_col_sum = 0u32;
    let mut seed_x = None;
    for x in margin.max(0)..(w - margin).max(0) {
        let mut sum = 0u32;
        for y in 0..h {
            if *view.get(x as usize, y as usize).expect("pixel in bounds") != 0 {
                sum += 1;
            }
        }
        if sum > best_col_sum {
            best_col_sum = sum;
            seed_x = Some(x);
        }
    }

    match (seed_x, seed_y) {
        (Some(x), Some(y)) => Ok((x, y)),
        // No dark mass anywhere: there is no pupil to anchor on.
        _ => Err(IrisMatchError::IrisNotFound),
    }
}

/// Finds the circle maximizing the integrodifferential response within the
/// center window and radius range.
///
/// For each candidate circle the perimeter-sum sequence over the radius axis
/// is convolved with the first derivative of a Gaussian (sigma 3, truncated
/// to three sigma). A response that never exceeds zero means no border.
fn peak_response(
    bright: &OwnedImage,
    center_x: i32,
    center_y: i32,
    area: i32,
    min_radius: i32,
    max_radius: i32,
) -> IrisMatchResult<Border> {
    let mut best: Option<Border> = None;
    let mut best_response = 0.0f64;

    for cx in (center_x - area)..=(center_x + area) {
        for cy in (center_y - area)..=(center_y + area) {
            for r in min_radius..max_radius {
                let mut response = 0.0f64;
                for k in (r - GAUSS_REACH)..(r + GAUSS_REACH) {
                    if k < 1 {
                        continue;
                    }
                    let weight = gauss(r - k + 1) - gauss(r - k);
                    response += weight * f64::from(perimeter_sum(bright, cx, cy, k));
                }
                if response > best_response {
                    best_response = response;
                    best = Some(Border::new(cx, cy, r));
                }
            }
        }
    }

    best.ok_or(IrisMatchError::IrisNotFound)
}

fn gauss(x: i32) -> f64 {
    let x = f64::from(x);
    (1.0 / (GAUSS_SIGMA * std::f64::consts::TAU.sqrt()))
        * (-x * x / (2.0 * GAUSS_SIGMA * GAUSS_SIGMA)).exp()
}

/// Counts set pixels along the circle perimeter via midpoint-circle
/// traversal; out-of-bounds points are skipped.
fn perimeter_sum(img: &OwnedImage, cx: i32, cy: i32, r: i32) -> u32 {
    let view = img.view();
    let (w, h) = (view.width() as i32, view.height() as i32);
    let mut sum = 0u32;

    let mut probe = |px: i32, py: i32| {
        if px >= 0 && px < w && py >= 0 && py < h {
            let row = view.row(py as usize).expect("row in bounds");
            if row[px as usize] != 0 {
                sum += 1;
            }
        }
    };

    if r <= 0 {
        probe(cx, cy);
        return sum;
    }

    let mut x = r;
    let mut y = 0;
    let mut d = 1 - r;
    while y <= x {
        probe(cx + x, cy + y);
        probe(cx - x, cy + y);
        probe(cx + x, cy - y);
        probe(cx - x, cy - y);
        probe(cx + y, cy + x);
        probe(cx - y, cy + x);
        probe(cx + y, cy - x);
        probe(cx - y, cy - x);

        y += 1;
        if d < 0 {
            d += 2 * y + 1;
        } else {
            x -= 1;
            d += 2 * (y - x) + 1;
        }
    }

    sum
}

#[cfg(test)]
mod tests {
    use super::{perimeter_sum, IntegroConfig, IntegroLocalizer};
    use crate::image::OwnedImage;
    use crate::localize::{Localize, SearchParams};
    use crate::util::IrisMatchError;

    #[test]
    fn perimeter_sum_counts_circle_pixels() {
        let img = OwnedImage::new(vec![255u8; 41 * 41], 41, 41).unwrap();
        let on_circle = perimeter_sum(&img, 20, 20, 10);
        assert!(on_circle > 0);
        let off_image = perimeter_sum(&img, 200, 200, 10);
        assert_eq!(off_image, 0);
    }

    #[test]
    fn uniform_images_report_not_found() {
        let localizer = IntegroLocalizer::new(IntegroConfig {
            search: SearchParams {
                min_radius: 5,
                max_radius: 20,
                threshold: 60,
                edge_margin: 4,
            },
            ..IntegroConfig::default()
        });

        let black = OwnedImage::new(vec![0u8; 96 * 96], 96, 96).unwrap();
        assert_eq!(
            localizer.localize(black.view()).err(),
            Some(IrisMatchError::IrisNotFound)
        );

        let white = OwnedImage::new(vec![255u8; 96 * 96], 96, 96).unwrap();
        assert_eq!(
            localizer.localize(white.view()).err(),
            Some(IrisMatchError::IrisNotFound)
        );
    }
}
