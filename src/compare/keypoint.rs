//! Keypoint comparison: multi-scale corners, patch descriptors, ratio test.
//!
//! Corners are detected with a FAST-9 segment test on every level of a box
//! pyramid (scale tolerance), suppressed to local maxima, and described by
//! mean-centered, L2-normalized intensity patches. Each probe descriptor is
//! matched against its two nearest template descriptors and kept when the
//! nearest is decisively closer than the runner-up.

use crate::compare::Compare;
use crate::image::pyramid::ImagePyramid;
use crate::image::ImageView;
use crate::normalize::NormalizedTemplate;
use crate::trace::{trace_event, trace_span};

/// Bresenham circle of radius 3 used by the segment test, clockwise.
const FAST_RING: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];
/// Contiguous ring samples required for a corner.
const FAST_ARC: usize = 9;
/// Descriptor patch side; descriptors have `PATCH * PATCH` components.
const PATCH: usize = 8;

/// Configuration for the keypoint strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointConfig {
    /// Authorization threshold. The reference value admits any score below
    /// 0.02, i.e. any nonempty match set; tighten per deployment.
    pub threshold: f64,
    /// Minimum ring-to-center contrast for the segment test.
    pub fast_threshold: u8,
    /// Nearest/second-nearest acceptance ratio.
    pub ratio: f64,
    /// Number of pyramid levels searched for corners.
    pub levels: usize,
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self {
            threshold: 0.02,
            fast_threshold: 20,
            ratio: 0.7,
            levels: 3,
        }
    }
}

/// Keypoint comparator.
pub struct KeypointComparator {
    config: KeypointConfig,
}

impl KeypointComparator {
    /// Creates a comparator with the given configuration.
    pub fn new(config: KeypointConfig) -> Self {
        Self { config }
    }

    fn descriptors(&self, template: &NormalizedTemplate) -> Vec<Vec<f32>> {
        let pyramid = ImagePyramid::build_u8(template.view(), self.config.levels)
            .expect("template shape is fixed");
        let mut descriptors = Vec::new();
        for level in pyramid.levels() {
            collect_level_descriptors(level.view(), self.config.fast_threshold, &mut descriptors);
        }
        descriptors
    }
}

impl Compare for KeypointComparator {
    /// `-(good matches / probe descriptors)`, in `[-1, 0]`; zero when either
    /// side lacks enough keypoints to run the ratio test.
    fn compare(&self, probe: &NormalizedTemplate, template: &NormalizedTemplate) -> f64 {
        let _guard = trace_span!("keypoint_compare").entered();

        let probe_descriptors = self.descriptors(probe);
        let tpl_descriptors = self.descriptors(template);
        if probe_descriptors.is_empty() || tpl_descriptors.len() < 2 {
            return 0.0;
        }

        let mut good = 0usize;
        for descriptor in &probe_descriptors {
            let (nearest, second) = two_nearest(descriptor, &tpl_descriptors);
            if nearest < self.config.ratio * second {
                good += 1;
            }
        }

        let score = -(good as f64) / probe_descriptors.len() as f64;
        trace_event!(
            "keypoint_score",
            score = score,
            probe_keypoints = probe_descriptors.len(),
            template_keypoints = tpl_descriptors.len()
        );
        score
    }

    fn threshold(&self) -> f64 {
        self.config.threshold
    }
}

/// Detects FAST-9 corners on one level, suppresses non-maxima in 3x3
/// neighborhoods, and appends patch descriptors for the survivors.
fn collect_level_descriptors(view: ImageView<'_, u8>, threshold: u8, out: &mut Vec<Vec<f32>>) {
    let (w, h) = (view.width(), view.height());
    if w < 2 * PATCH || h < 2 * PATCH {
        return;
    }

    let mut scores = vec![0u32; w * h];
    for y in 3..h - 3 {
        for x in 3..w - 3 {
            scores[y * w + x] = fast_score(view, x, y, threshold);
        }
    }

    let half = PATCH / 2;
    for y in half.max(4)..h - half {
        for x in half.max(4)..w - half {
            let score = scores[y * w + x];
            if score == 0 {
                continue;
            }
            let mut is_peak = true;
            'nms: for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (x as i32 + dx) as usize;
                    let ny = (y as i32 + dy) as usize;
                    let neighbor = scores[ny * w + nx];
                    // Strict comparison on one side keeps exactly one peak in
                    // a tied plateau.
                    if neighbor > score || (neighbor == score && (dy < 0 || (dy == 0 && dx < 0))) {
                        is_peak = false;
                        break 'nms;
                    }
                }
            }
            if is_peak {
                if let Some(descriptor) = patch_descriptor(view, x, y) {
                    out.push(descriptor);
                }
            }
        }
    }
}

/// Corner strength: contrast mass of the ring when at least [`FAST_ARC`]
/// contiguous samples are all brighter or all darker than the center.
fn fast_score(view: ImageView<'_, u8>, x: usize, y: usize, threshold: u8) -> u32 {
    let center = i32::from(*view.get(x, y).expect("pixel in bounds"));
    let t = i32::from(threshold);

    let mut brighter = [false; 16];
    let mut darker = [false; 16];
    let mut contrast = 0u32;
    for (i, (dx, dy)) in FAST_RING.iter().enumerate() {
        let sx = (x as i32 + dx) as usize;
        let sy = (y as i32 + dy) as usize;
        let value = i32::from(*view.get(sx, sy).expect("ring in bounds"));
        brighter[i] = value >= center + t;
        darker[i] = value <= center - t;
        contrast += (value - center).unsigned_abs().saturating_sub(t as u32);
    }

    if longest_arc(&brighter) >= FAST_ARC || longest_arc(&darker) >= FAST_ARC {
        contrast
    } else {
        0
    }
}

/// Longest run of set flags on the circular ring.
fn longest_arc(flags: &[bool; 16]) -> usize {
    let mut longest = 0usize;
    let mut run = 0usize;
    // Doubling the ring resolves wrap-around runs; runs are capped at 16.
    for i in 0..32 {
        if flags[i % 16] {
            run += 1;
            longest = longest.max(run.min(16));
        } else {
            run = 0;
        }
    }
    longest
}

/// Mean-centered, L2-normalized intensity patch around the keypoint.
///
/// Returns `None` for zero-variance patches, which carry no signal.
fn patch_descriptor(view: ImageView<'_, u8>, x: usize, y: usize) -> Option<Vec<f32>> {
    let half = PATCH / 2;
    let mut values = Vec::with_capacity(PATCH * PATCH);
    for py in (y - half)..(y + half) {
        let row = view.row(py).expect("patch row in bounds");
        for px in (x - half)..(x + half) {
            values.push(f32::from(row[px]));
        }
    }

    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let mut norm_sq = 0.0f32;
    for v in values.iter_mut() {
        *v -= mean;
        norm_sq += *v * *v;
    }
    if norm_sq <= f32::EPSILON {
        return None;
    }
    let norm = norm_sq.sqrt();
    for v in values.iter_mut() {
        *v /= norm;
    }
    Some(values)
}

/// Euclidean distances to the two nearest template descriptors.
fn two_nearest(descriptor: &[f32], candidates: &[Vec<f32>]) -> (f64, f64) {
    let mut nearest = f64::INFINITY;
    let mut second = f64::INFINITY;
    for candidate in candidates {
        let mut dist_sq = 0.0f32;
        for (a, b) in descriptor.iter().zip(candidate) {
            let d = a - b;
            dist_sq += d * d;
        }
        let dist = f64::from(dist_sq).sqrt();
        if dist < nearest {
            second = nearest;
            nearest = dist;
        } else if dist < second {
            second = dist;
        }
    }
    (nearest, second)
}

#[cfg(test)]
mod tests {
    use super::{longest_arc, KeypointComparator, KeypointConfig};
    use crate::compare::Compare;
    use crate::normalize::{NormalizedTemplate, NORMALIZED_COLS, NORMALIZED_ROWS};

    /// Bright two-pixel clusters on a dark background; every cluster is a
    /// FAST corner, and the varying side-pixel intensity gives each patch a
    /// distinctive shape that survives descriptor normalization.
    fn dotted_template(phase: usize) -> NormalizedTemplate {
        const SIDE: [(usize, usize); 4] = [(1, 0), (0, 1), (1, 1), (2, 0)];
        let mut data = vec![20u8; NormalizedTemplate::SAMPLES];
        let mut index = 0usize;
        for y in (12..NORMALIZED_ROWS - 12).step_by(16) {
            for x in (12..NORMALIZED_COLS - 12).step_by(16) {
                data[y * NORMALIZED_COLS + x] = 200;
                let (dx, dy) = SIDE[(index + phase) % SIDE.len()];
                let side = 60 + ((index * 7 + phase * 31) % 130);
                data[(y + dy) * NORMALIZED_COLS + (x + dx)] = side as u8;
                index += 1;
            }
        }
        NormalizedTemplate::from_bytes(data).unwrap()
    }

    #[test]
    fn longest_arc_handles_wraparound() {
        let mut flags = [false; 16];
        for i in [14, 15, 0, 1, 2] {
            flags[i] = true;
        }
        assert_eq!(longest_arc(&flags), 5);
        assert_eq!(longest_arc(&[true; 16]), 16);
        assert_eq!(longest_arc(&[false; 16]), 0);
    }

    #[test]
    fn self_comparison_is_strong_and_bounded() {
        let comparator = KeypointComparator::new(KeypointConfig::default());
        let template = dotted_template(0);
        let score = comparator.compare(&template, &template);
        assert!((-1.0..=0.0).contains(&score), "got {score}");
        assert!(score <= -0.5, "self-match should be dominant, got {score}");
    }

    #[test]
    fn featureless_grids_score_zero() {
        let comparator = KeypointComparator::new(KeypointConfig::default());
        let flat = NormalizedTemplate::from_bytes(vec![128; NormalizedTemplate::SAMPLES]).unwrap();
        let textured = dotted_template(0);
        assert_eq!(comparator.compare(&flat, &textured), 0.0);
        assert_eq!(comparator.compare(&textured, &flat), 0.0);
    }

    #[test]
    fn unrelated_texture_scores_weaker_than_self() {
        let comparator = KeypointComparator::new(KeypointConfig::default());
        let a = dotted_template(0);
        let b = dotted_template(5);
        let self_score = comparator.compare(&a, &a);
        let cross_score = comparator.compare(&a, &b);
        assert!(self_score <= cross_score);
    }
}
