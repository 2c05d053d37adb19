//! Template comparison strategies.
//!
//! Every strategy turns two normalized templates into a scalar dissimilarity
//! score. Scales differ per strategy and are not comparable across
//! strategies, but the direction is uniform: lower is better, more negative
//! (or smaller) means a stronger match. Each strategy owns its authorization
//! threshold.

use crate::normalize::NormalizedTemplate;

mod correlation;
mod keypoint;
mod phase;

pub use correlation::{CorrelationComparator, CorrelationConfig};
pub use keypoint::{KeypointComparator, KeypointConfig};
pub use phase::{PhaseCodeComparator, PhaseCodeConfig};

/// Comparison contract shared by all strategies.
pub trait Compare {
    /// Scores the dissimilarity of two templates. Lower is better.
    fn compare(&self, probe: &NormalizedTemplate, template: &NormalizedTemplate) -> f64;

    /// The strategy-owned authorization threshold.
    fn threshold(&self) -> f64;

    /// Whether the pair is close enough to authorize:
    /// `compare(probe, template) < threshold`.
    fn authorize(&self, probe: &NormalizedTemplate, template: &NormalizedTemplate) -> bool {
        self.compare(probe, template) < self.threshold()
    }
}

/// Closed set of comparison strategies, selected at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparatorConfig {
    /// Gabor phase codes with sampled Hamming-style agreement.
    PhaseCode(PhaseCodeConfig),
    /// Normalized squared-difference over the full grids.
    Correlation(CorrelationConfig),
    /// Keypoint descriptors with a nearest-neighbor ratio test.
    Keypoint(KeypointConfig),
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self::PhaseCode(PhaseCodeConfig::default())
    }
}

/// Comparator dispatcher over the closed strategy set.
pub enum Comparator {
    /// Phase-code strategy.
    PhaseCode(PhaseCodeComparator),
    /// Correlation strategy.
    Correlation(CorrelationComparator),
    /// Keypoint strategy.
    Keypoint(KeypointComparator),
}

impl Comparator {
    /// Builds the configured strategy.
    pub fn new(config: ComparatorConfig) -> Self {
        match config {
            ComparatorConfig::PhaseCode(cfg) => Self::PhaseCode(PhaseCodeComparator::new(cfg)),
            ComparatorConfig::Correlation(cfg) => {
                Self::Correlation(CorrelationComparator::new(cfg))
            }
            ComparatorConfig::Keypoint(cfg) => Self::Keypoint(KeypointComparator::new(cfg)),
        }
    }
}

impl Compare for Comparator {
    fn compare(&self, probe: &NormalizedTemplate, template: &NormalizedTemplate) -> f64 {
        match self {
            Self::PhaseCode(inner) => inner.compare(probe, template),
            Self::Correlation(inner) => inner.compare(probe, template),
            Self::Keypoint(inner) => inner.compare(probe, template),
        }
    }

    fn threshold(&self) -> f64 {
        match self {
            Self::PhaseCode(inner) => inner.threshold(),
            Self::Correlation(inner) => inner.threshold(),
            Self::Keypoint(inner) => inner.threshold(),
        }
    }
}
