//! Iris border localization.
//!
//! Two interchangeable search strategies locate the pupil (inner) and iris
//! (outer) circular borders in an intensity image: an integrodifferential
//! search ([`IntegroLocalizer`]) and a voting-accumulator search
//! ([`AccumulatorLocalizer`]). Both share the adaptive outer-border parameter
//! derivation in this module.

use crate::image::ImageView;
use crate::normalize::ray_concentric;
use crate::util::IrisMatchResult;

mod accumulator;
mod integro;
pub(crate) mod prep;

pub use accumulator::{AccumulatorConfig, AccumulatorLocalizer};
pub use integro::{IntegroConfig, IntegroLocalizer};

/// A circular border: center `(x, y)` and radius `r`, in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    /// Center column.
    pub x: i32,
    /// Center row.
    pub y: i32,
    /// Radius.
    pub r: i32,
}

impl Border {
    /// Creates a border from center coordinates and radius.
    pub fn new(x: i32, y: i32, r: i32) -> Self {
        Self { x, y, r }
    }
}

/// The pair of borders delimiting the iris annulus.
///
/// `inner.r < outer.r` is expected but not mechanically enforced; a
/// localization failure can produce a degenerate pair, which the normalizer
/// tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrisBorders {
    /// The pupil border.
    pub inner: Border,
    /// The iris border.
    pub outer: Border,
}

impl IrisBorders {
    /// Creates a border pair.
    pub fn new(inner: Border, outer: Border) -> Self {
        Self { inner, outer }
    }
}

/// Search bounds shared by both localization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Minimum candidate radius (exclusive lower bound for accumulator votes).
    pub min_radius: i32,
    /// Maximum candidate radius (exclusive).
    pub max_radius: i32,
    /// Binarization threshold for the inner-border search.
    pub threshold: u8,
    /// Margin kept from the image edges during the search.
    pub edge_margin: i32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_radius: 20,
            max_radius: 60,
            threshold: 60,
            edge_margin: 20,
        }
    }
}

/// Border localization contract.
///
/// Fails with [`crate::IrisMatchError::IrisNotFound`] when no plausible
/// border exists (degenerate intensity distribution, eye not fully visible).
/// A default border is never fabricated.
pub trait Localize {
    /// Finds the inner and outer iris borders in `image`.
    fn localize(&self, image: ImageView<'_, u8>) -> IrisMatchResult<IrisBorders>;
}

/// Closed set of localization strategies, selected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizerConfig {
    /// Integrodifferential search.
    Integro(IntegroConfig),
    /// Voting-accumulator search.
    Accumulator(AccumulatorConfig),
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self::Accumulator(AccumulatorConfig::default())
    }
}

/// Localizer dispatcher over the closed strategy set.
pub enum Localizer {
    /// Integrodifferential search.
    Integro(IntegroLocalizer),
    /// Voting-accumulator search.
    Accumulator(AccumulatorLocalizer),
}

impl Localizer {
    /// Builds the configured strategy.
    pub fn new(config: LocalizerConfig) -> Self {
        match config {
            LocalizerConfig::Integro(cfg) => Self::Integro(IntegroLocalizer::new(cfg)),
            LocalizerConfig::Accumulator(cfg) => Self::Accumulator(AccumulatorLocalizer::new(cfg)),
        }
    }
}

impl Localize for Localizer {
    fn localize(&self, image: ImageView<'_, u8>) -> IrisMatchResult<IrisBorders> {
        match self {
            Self::Integro(inner) => inner.localize(image),
            Self::Accumulator(inner) => inner.localize(image),
        }
    }
}

/// Parameters for the outer-border search, derived per image.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OuterSearch {
    pub threshold: u8,
    pub min_radius: i32,
    pub max_radius: i32,
}

/// Adapts the outer-border search to per-image contrast.
///
/// Samples a 64x256 polar grid spanning the annulus immediately outside the
/// inner border (effective outer radius `2 * inner.r`, same mapping as the
/// normalizer, coordinates clamped to bounds), then sets the binarization
/// threshold to `mean + (2/5) * sqrt(variance)` of the sampled intensities.
/// Radius bounds become `[2 * inner.r, 4 * inner.r)`.
pub(crate) fn derive_outer_search(image: ImageView<'_, u8>, inner: &Border) -> OuterSearch {
    const ROWS: usize = 64;
    const COLS: usize = 256;

    let eff_r = inner.r * 2;
    let count = (ROWS * COLS) as f64;

    let mut mean = 0.0;
    for row in 0..ROWS {
        for col in 0..COLS {
            let p = row as f64 / ROWS as f64;
            let theta = col as f64 * std::f64::consts::TAU / COLS as f64;
            let (sx, sy) = ray_concentric(inner, eff_r, p, theta);
            mean += f64::from(image.sample_clamped(sx, sy)) / count;
        }
    }

    let mut variance = 0.0;
    for row in 0..ROWS {
        for col in 0..COLS {
            let p = row as f64 / ROWS as f64;
            let theta = col as f64 * std::f64::consts::TAU / COLS as f64;
            let (sx, sy) = ray_concentric(inner, eff_r, p, theta);
            let diff = f64::from(image.sample_clamped(sx, sy)) - mean;
            variance += diff * diff / count;
        }
    }

    let threshold = (mean + variance.sqrt() * 2.0 / 5.0).round().clamp(0.0, 255.0) as u8;
    OuterSearch {
        threshold,
        min_radius: inner.r * 2,
        max_radius: inner.r * 4,
    }
}
