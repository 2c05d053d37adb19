//! Polar normalization of the iris annulus.
//!
//! The annulus between the two borders is resampled into a fixed 128x256
//! grid, removing scale and position variation before comparison. There is no
//! failure path: degenerate borders yield a degenerate but correctly shaped
//! template. Source lookups outside the image clamp to the nearest pixel.

use crate::image::ImageView;
use crate::localize::{Border, IrisBorders};
use crate::trace::trace_span;
use crate::util::{IrisMatchError, IrisMatchResult};

/// Radial resolution of a normalized template.
pub const NORMALIZED_ROWS: usize = 128;
/// Angular resolution of a normalized template.
pub const NORMALIZED_COLS: usize = 256;

/// A normalized iris template: always exactly 128x256 8-bit samples.
///
/// The shape is a hard wire contract with template storage; any codec must
/// round-trip it unchanged. Row 0 sits at the effective outer radius, the
/// last row at the inner border; columns sweep the full angle range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTemplate {
    data: Vec<u8>,
}

impl NormalizedTemplate {
    /// Number of samples (and bytes) in every template.
    pub const SAMPLES: usize = NORMALIZED_ROWS * NORMALIZED_COLS;

    /// Wraps an exactly-sized sample buffer.
    pub fn from_bytes(data: Vec<u8>) -> IrisMatchResult<Self> {
        if data.len() < Self::SAMPLES {
            return Err(IrisMatchError::BufferTooSmall {
                needed: Self::SAMPLES,
                got: data.len(),
            });
        }
        if data.len() > Self::SAMPLES {
            return Err(IrisMatchError::InvalidDimensions {
                width: NORMALIZED_COLS,
                height: NORMALIZED_ROWS,
            });
        }
        Ok(Self { data })
    }

    /// Returns the sample at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * NORMALIZED_COLS + col]
    }

    /// Returns the raw sample buffer (row-major).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the template into its raw sample buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns a borrowed image view of the template grid.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView::from_slice(&self.data, NORMALIZED_COLS, NORMALIZED_ROWS)
            .expect("template shape is fixed")
    }
}

/// Ray geometry used by the polar mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Both borders share a center; rays follow a single radial direction.
    Concentric,
    /// Borders have independent centers; rays interpolate between the
    /// inner-border and outer-border points.
    #[default]
    Eccentric,
}

/// Configuration for the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeConfig {
    /// Ray geometry.
    pub mode: NormalizeMode,
}

/// Polar normalizer.
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    /// Creates a normalizer with the given configuration.
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// Resamples the iris annulus into the canonical 128x256 grid.
    ///
    /// Each output cell `(row, col)` maps to angle `theta = col * 2pi / 256`
    /// and radial fraction `p = row / 128` along the ray from the effective
    /// outer radius (`inner.r + 4/5 * (outer.r - inner.r)`) to the inner
    /// border, sampled nearest-neighbor.
    pub fn normalize(
        &self,
        image: ImageView<'_, u8>,
        borders: &IrisBorders,
    ) -> NormalizedTemplate {
        let _guard = trace_span!("normalize").entered();

        let inner = &borders.inner;
        let outer = &borders.outer;
        let eff_r = inner.r + (outer.r - inner.r) * 4 / 5;

        let mut data = Vec::with_capacity(NormalizedTemplate::SAMPLES);
        for row in 0..NORMALIZED_ROWS {
            let p = row as f64 / NORMALIZED_ROWS as f64;
            for col in 0..NORMALIZED_COLS {
                let theta = col as f64 * std::f64::consts::TAU / NORMALIZED_COLS as f64;
                let (sx, sy) = match self.config.mode {
                    NormalizeMode::Concentric => ray_concentric(inner, eff_r, p, theta),
                    NormalizeMode::Eccentric => ray_eccentric(inner, outer, eff_r, p, theta),
                };
                data.push(image.sample_clamped(sx, sy));
            }
        }

        NormalizedTemplate { data }
    }
}

/// Source coordinates on the radial ray when both borders share a center.
pub(crate) fn ray_concentric(inner: &Border, eff_r: i32, p: f64, theta: f64) -> (i64, i64) {
    let (sin, cos) = theta.sin_cos();
    let span = f64::from(eff_r - inner.r);
    let x = (1.0 - p) * span * cos + (f64::from(inner.x) + f64::from(inner.r) * cos);
    let y = (1.0 - p) * span * sin + (f64::from(inner.y) + f64::from(inner.r) * sin);
    (x.round() as i64, y.round() as i64)
}

/// Source coordinates interpolating between the outer- and inner-border
/// points when the centers differ.
pub(crate) fn ray_eccentric(
    inner: &Border,
    outer: &Border,
    eff_r: i32,
    p: f64,
    theta: f64,
) -> (i64, i64) {
    let (sin, cos) = theta.sin_cos();
    let outer_x = f64::from(outer.x) + f64::from(eff_r) * cos;
    let outer_y = f64::from(outer.y) + f64::from(eff_r) * sin;
    let inner_x = f64::from(inner.x) + f64::from(inner.r) * cos;
    let inner_y = f64::from(inner.y) + f64::from(inner.r) * sin;
    let x = (1.0 - p) * outer_x + p * inner_x;
    let y = (1.0 - p) * outer_y + p * inner_y;
    (x.round() as i64, y.round() as i64)
}
