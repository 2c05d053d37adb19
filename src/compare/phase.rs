//! Phase-code comparison: Gabor filtering plus sampled Hamming agreement.
//!
//! Probe and template are filtered with a fixed quadrature pair of Gabor
//! kernels. Agreement is measured on a sparse sample grid by checking whether
//! corresponding filtered values fall on the same side of the mid-intensity
//! threshold, and rotational misalignment is absorbed by scoring circular
//! column shifts of the probe code.

use crate::compare::Compare;
use crate::image::OwnedImage;
use crate::normalize::{NormalizedTemplate, NORMALIZED_COLS, NORMALIZED_ROWS};
use crate::trace::{trace_event, trace_span};

/// Row/column strides of the agreement sample grid.
const SAMPLE_ROW_STEP: usize = 8;
const SAMPLE_COL_STEP: usize = 4;
/// Mid-intensity split for the phase decision.
const PHASE_SPLIT: u8 = 128;

/// Configuration for the phase-code strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCodeConfig {
    /// Gaussian envelope width; the kernel extent is `6 * sigma + 1`.
    pub sigma: f64,
    /// Kernel orientation in radians.
    pub theta: f64,
    /// Carrier wavelength.
    pub lambda: f64,
    /// Envelope aspect ratio.
    pub gamma: f64,
    /// Maximum circular column shift scored in each direction.
    pub max_shift: usize,
    /// Authorization threshold.
    pub threshold: f64,
}

impl Default for PhaseCodeConfig {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            theta: 0.0,
            lambda: 3.0,
            gamma: 1.0,
            max_shift: 2,
            threshold: -0.3,
        }
    }
}

/// Square convolution kernel with odd extent.
struct Kernel {
    data: Vec<f64>,
    size: usize,
}

/// Phase-code comparator holding the prebuilt quadrature kernel pair.
pub struct PhaseCodeComparator {
    real_kernel: Kernel,
    imag_kernel: Kernel,
    max_shift: usize,
    threshold: f64,
}

impl PhaseCodeComparator {
    /// Builds the comparator, materializing both Gabor kernels.
    pub fn new(config: PhaseCodeConfig) -> Self {
        Self {
            real_kernel: gabor_kernel(&config, 0.0),
            imag_kernel: gabor_kernel(&config, std::f64::consts::FRAC_PI_2),
            max_shift: config.max_shift,
            threshold: config.threshold,
        }
    }
}

impl Compare for PhaseCodeComparator {
    fn compare(&self, probe: &NormalizedTemplate, template: &NormalizedTemplate) -> f64 {
        let _guard = trace_span!("phase_compare").entered();

        let probe_real = filter_reflect(probe, &self.real_kernel);
        let probe_imag = filter_reflect(probe, &self.imag_kernel);
        let tpl_real = filter_reflect(template, &self.real_kernel);
        let tpl_imag = filter_reflect(template, &self.imag_kernel);

        let mut best = pair_score(&probe_real, &probe_imag, &tpl_real, &tpl_imag);

        let mut left_real = probe_real.clone();
        let mut left_imag = probe_imag.clone();
        let mut right_real = probe_real;
        let mut right_imag = probe_imag;

        for _ in 0..self.max_shift {
            left_real = shift_left(&left_real);
            left_imag = shift_left(&left_imag);
            right_real = shift_right(&right_real);
            right_imag = shift_right(&right_imag);

            best = best.min(pair_score(&left_real, &left_imag, &tpl_real, &tpl_imag));
            best = best.min(pair_score(&right_real, &right_imag, &tpl_real, &tpl_imag));
        }

        trace_event!("phase_score", score = best);
        best
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Average agreement over the real and imaginary channels, negated so that
/// stronger matches are more negative. Lies in `[-1, 0]`.
fn pair_score(
    probe_real: &OwnedImage,
    probe_imag: &OwnedImage,
    tpl_real: &OwnedImage,
    tpl_imag: &OwnedImage,
) -> f64 {
    -(agreement(probe_real, tpl_real) + agreement(probe_imag, tpl_imag)) / 2.0
}

/// Fraction of sample-grid positions where both codes fall on the same side
/// of the mid-intensity split.
fn agreement(a: &OwnedImage, b: &OwnedImage) -> f64 {
    let mut matched = 0usize;
    let mut samples = 0usize;
    let av = a.view();
    let bv = b.view();

    for row in (0..NORMALIZED_ROWS).step_by(SAMPLE_ROW_STEP) {
        let ar = av.row(row).expect("row in bounds");
        let br = bv.row(row).expect("row in bounds");
        for col in (0..NORMALIZED_COLS).step_by(SAMPLE_COL_STEP) {
            samples += 1;
            if (ar[col] <= PHASE_SPLIT) == (br[col] <= PHASE_SPLIT) {
                matched += 1;
            }
        }
    }

    matched as f64 / samples as f64
}

/// Builds a Gabor kernel with extent `6 * sigma + 1` and phase offset `psi`.
fn gabor_kernel(config: &PhaseCodeConfig, psi: f64) -> Kernel {
    let half = (3.0 * config.sigma).floor().max(1.0) as i64;
    let size = (2 * half + 1) as usize;
    let (sin_t, cos_t) = config.theta.sin_cos();
    let denom = 2.0 * config.sigma * config.sigma;
    let omega = std::f64::consts::TAU / config.lambda;

    let mut data = Vec::with_capacity(size * size);
    for y in -half..=half {
        for x in -half..=half {
            let xr = x as f64 * cos_t + y as f64 * sin_t;
            let yr = -(x as f64) * sin_t + y as f64 * cos_t;
            let envelope = (-(xr * xr + config.gamma * config.gamma * yr * yr) / denom).exp();
            data.push(envelope * (omega * xr + psi).cos());
        }
    }

    Kernel { data, size }
}

/// 2-D correlation with reflect-101 border handling, saturated to `u8`.
fn filter_reflect(template: &NormalizedTemplate, kernel: &Kernel) -> OwnedImage {
    let src = template.view();
    let (w, h) = (NORMALIZED_COLS as i64, NORMALIZED_ROWS as i64);
    let half = (kernel.size / 2) as i64;
    let mut out = vec![0u8; NormalizedTemplate::SAMPLES];

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f64;
            for ky in -half..=half {
                let sy = reflect101(y + ky, h);
                let row = src.row(sy as usize).expect("row in bounds");
                let kbase = ((ky + half) as usize) * kernel.size;
                for kx in -half..=half {
                    let sx = reflect101(x + kx, w);
                    acc += kernel.data[kbase + (kx + half) as usize] * f64::from(row[sx as usize]);
                }
            }
            out[(y * w + x) as usize] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    OwnedImage::new(out, NORMALIZED_COLS, NORMALIZED_ROWS).expect("filtered buffer is exact")
}

/// Reflects an index into `[0, n)` without repeating the border sample.
fn reflect101(i: i64, n: i64) -> i64 {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i
}

/// Circular column shift; the inverse of [`shift_right`].
pub(crate) fn shift_left(grid: &OwnedImage) -> OwnedImage {
    shift_columns(grid, |col, cols| (col + cols - 1) % cols)
}

/// Circular column shift; the inverse of [`shift_left`].
pub(crate) fn shift_right(grid: &OwnedImage) -> OwnedImage {
    shift_columns(grid, |col, cols| (col + 1) % cols)
}

fn shift_columns(grid: &OwnedImage, source_col: impl Fn(usize, usize) -> usize) -> OwnedImage {
    let view = grid.view();
    let (w, h) = (view.width(), view.height());
    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        let row = view.row(y).expect("row in bounds");
        for x in 0..w {
            out.push(row[source_col(x, w)]);
        }
    }
    OwnedImage::new(out, w, h).expect("shifted buffer is exact")
}
