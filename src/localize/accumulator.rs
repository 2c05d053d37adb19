//! Voting-accumulator border search.
//!
//! After binarization, an opening pass, and a Sobel gradient, every
//! gradient-positive pixel votes `1/r` for all candidate `(cx, cy, r)`
//! circles passing through it. The global vote maximum is the border. The
//! accumulator cost is proportional to `rows * cols * max_radius`; keep the
//! radius range tight on large images.

use crate::image::ImageView;
use crate::localize::prep::{binarize, close_rect, open_rect, sobel_magnitude};
use crate::localize::{
    derive_outer_search, Border, IrisBorders, Localize, OuterSearch, SearchParams,
};
use crate::trace::{trace_event, trace_span};
use crate::util::{IrisMatchError, IrisMatchResult};

/// Structuring-element half-widths for the inner and outer searches.
const INNER_MORPH_HALF: usize = 3;
const OUTER_MORPH_HALF: usize = 2;

/// Configuration for the accumulator search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorConfig {
    /// Shared radius/threshold/margin bounds.
    pub search: SearchParams,
    /// When true the outer border is anchored at the inner center; otherwise
    /// its center is searched within an offset window of `inner.r / 8`.
    pub shared_center: bool,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            shared_center: false,
        }
    }
}

/// Accumulator localizer.
pub struct AccumulatorLocalizer {
    config: AccumulatorConfig,
}

impl AccumulatorLocalizer {
    /// Creates a localizer with the given configuration.
    pub fn new(config: AccumulatorConfig) -> Self {
        Self { config }
    }
}

impl Localize for AccumulatorLocalizer {
    fn localize(&self, image: ImageView<'_, u8>) -> IrisMatchResult<IrisBorders> {
        let _guard = trace_span!("accumulator_localize").entered();

        let inner = self.inner_border(image)?;
        trace_event!("inner_border", x = inner.x, y = inner.y, r = inner.r);

        let outer_search = derive_outer_search(image, &inner);
        let outer = if self.config.shared_center {
            self.outer_border_shared(image, &outer_search, &inner)?
        } else {
            self.outer_border_offset(image, &outer_search, &inner, inner.r / 8)?
        };
        trace_event!("outer_border", x = outer.x, y = outer.y, r = outer.r);

        Ok(IrisBorders::new(inner, outer))
    }
}

impl AccumulatorLocalizer {
    fn inner_border(&self, image: ImageView<'_, u8>) -> IrisMatchResult<Border> {
        let params = &self.config.search;
        let bin = binarize(image, params.threshold);
        let opened = open_rect(&bin, INNER_MORPH_HALF);
        let grad = sobel_magnitude(&opened);

        let view = grad.view();
        let (w, h) = (view.width() as i32, view.height() as i32);
        let max_r = params.max_radius.max(1) as usize;

        // Flat (cy, cx, r) accumulator, the dominant allocation of the search.
        let mut acc = vec![0.0f32; w as usize * h as usize * max_r];
        let mut best: Option<Border> = None;
        let mut best_votes = 0.0f32;

        let margin = params.edge_margin.max(0);
        for py in margin..(h - margin).max(margin) {
            let row = view.row(py as usize).expect("row in bounds");
            for px in margin..(w - margin).max(margin) {
                if row[px as usize] == 0 {
                    continue;
                }
                let cx0 = (px - params.max_radius).max(0);
                let cx1 = (px + params.max_radius).min(w);
                let cy0 = (py - params.max_radius).max(0);
                let cy1 = (py + params.max_radius).min(h);

                for cy in cy0..cy1 {
                    for cx in cx0..cx1 {
                        let Some(r) = vote_radius(px - cx, py - cy, params.min_radius, params.max_radius)
                        else {
                            continue;
                        };
                        let idx = ((cy * w + cx) as usize) * max_r + r as usize;
                        acc[idx] += 1.0 / r as f32;
                        if acc[idx] > best_votes {
                            best_votes = acc[idx];
                            best = Some(Border::new(cx, cy, r));
                        }
                    }
                }
            }
        }

        best.ok_or(IrisMatchError::IrisNotFound)
    }

    /// Outer border anchored at the inner center: a 1-D radius accumulator.
    fn outer_border_shared(
        &self,
        image: ImageView<'_, u8>,
        search: &OuterSearch,
        inner: &Border,
    ) -> IrisMatchResult<Border> {
        let bin = binarize(image, search.threshold);
        let opened = open_rect(&bin, OUTER_MORPH_HALF);
        let grad = sobel_magnitude(&opened);

        let view = grad.view();
        let (w, h) = (view.width() as i32, view.height() as i32);
        let max_r = search.max_radius.max(1) as usize;

        let mut acc = vec![0.0f64; max_r];
        let mut best_r: Option<i32> = None;
        let mut best_votes = 0.0f64;

        let py0 = (inner.y - search.max_radius).max(0);
        let py1 = (inner.y + search.max_radius).min(h);
        let px0 = (inner.x - search.max_radius).max(0);
        let px1 = (inner.x + search.max_radius).min(w);

        for py in py0..py1 {
            let row = view.row(py as usize).expect("row in bounds");
            for px in px0..px1 {
                if row[px as usize] == 0 {
                    continue;
                }
                let Some(r) =
                    vote_radius(px - inner.x, py - inner.y, search.min_radius, search.max_radius)
                else {
                    continue;
                };
                acc[r as usize] += 1.0 / f64::from(r);
                if acc[r as usize] > best_votes {
                    best_votes = acc[r as usize];
                    best_r = Some(r);
                }
            }
        }

        best_r
            .map(|r| Border::new(inner.x, inner.y, r))
            .ok_or(IrisMatchError::IrisNotFound)
    }

    /// Outer border with its own center, searched within `offset` of the
    /// inner center. The accumulator is sized to the offset window.
    fn outer_border_offset(
        &self,
        image: ImageView<'_, u8>,
        search: &OuterSearch,
        inner: &Border,
        offset: i32,
    ) -> IrisMatchResult<Border> {
        let bin = binarize(image, search.threshold);
        let closed = close_rect(&bin, OUTER_MORPH_HALF);
        let grad = sobel_magnitude(&closed);

        let view = grad.view();
        let (w, h) = (view.width() as i32, view.height() as i32);
        let offset = offset.max(0);

        let wx0 = (inner.x - offset).max(0);
        let wx1 = (inner.x + offset).min(w - 1).max(wx0);
        let wy0 = (inner.y - offset).max(0);
        let wy1 = (inner.y + offset).min(h - 1).max(wy0);
        let win_w = (wx1 - wx0 + 1) as usize;
        let win_h = (wy1 - wy0 + 1) as usize;
        let max_r = search.max_radius.max(1) as usize;

        let mut acc = vec![0.0f64; win_w * win_h * max_r];
        let mut best: Option<Border> = None;
        let mut best_votes = 0.0f64;

        let reach = search.max_radius + offset;
        let py0 = (inner.y - reach).max(0);
        let py1 = (inner.y + reach).min(h);
        let px0 = (inner.x - reach).max(0);
        let px1 = (inner.x + reach).min(w);

        for py in py0..py1 {
            let row = view.row(py as usize).expect("row in bounds");
            for px in px0..px1 {
                if row[px as usize] == 0 {
                    continue;
                }
                for wy in wy0..=wy1 {
                    for wx in wx0..=wx1 {
                        let Some(r) =
                            vote_radius(px - wx, py - wy, search.min_radius, search.max_radius)
                        else {
                            continue;
                        };
                        let idx = (((wy - wy0) as usize * win_w) + (wx - wx0) as usize) * max_r
                            + r as usize;
                        acc[idx] += 1.0 / f64::from(r);
                        if acc[idx] > best_votes {
                            best_votes = acc[idx];
                            best = Some(Border::new(wx, wy, r));
                        }
                    }
                }
            }
        }

        best.ok_or(IrisMatchError::IrisNotFound)
    }
}

/// Rounded candidate radius if it falls strictly inside the vote bounds.
fn vote_radius(dx: i32, dy: i32, min_radius: i32, max_radius: i32) -> Option<i32> {
    let r = f64::from(dx * dx + dy * dy).sqrt().round() as i32;
    (r > min_radius && r < max_radius).then_some(r)
}
