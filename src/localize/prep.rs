//! Preprocessing for border search: binarization, rectangular morphology,
//! and a Sobel gradient operator.
//!
//! Pixels are treated as binary with threshold `> 0` after binarization;
//! outputs are `0` or `255` in `u8`.

use crate::image::{ImageView, OwnedImage};

/// Binarizes with `on = 255` where the source value exceeds `threshold`.
pub(crate) fn binarize(src: ImageView<'_, u8>, threshold: u8) -> OwnedImage {
    map_pixels(src, |v| if v > threshold { 255 } else { 0 })
}

/// Inverted binarization: `on = 255` where the source value is at most
/// `threshold`. Used to isolate the dark pupil mass.
pub(crate) fn binarize_inv(src: ImageView<'_, u8>, threshold: u8) -> OwnedImage {
    map_pixels(src, |v| if v > threshold { 0 } else { 255 })
}

fn map_pixels(src: ImageView<'_, u8>, f: impl Fn(u8) -> u8) -> OwnedImage {
    let mut data = Vec::with_capacity(src.width() * src.height());
    for y in 0..src.height() {
        let row = src.row(y).expect("row in bounds");
        data.extend(row.iter().map(|&v| f(v)));
    }
    OwnedImage::new(data, src.width(), src.height()).expect("binarized buffer is exact")
}

/// Erodes with a `(2*half+1)` square structuring element.
///
/// Out-of-bounds neighbors count as unset, so the frame erodes inward.
pub(crate) fn erode_rect(src: &OwnedImage, half: usize) -> OwnedImage {
    let view = src.view();
    let (w, h) = (view.width(), view.height());
    let half = half as isize;
    let mut out = vec![0u8; w * h];

    for y in 0..h as isize {
        for x in 0..w as isize {
            let mut all_set = true;
            'probe: for dy in -half..=half {
                let ny = y + dy;
                if ny < 0 || ny >= h as isize {
                    all_set = false;
                    break;
                }
                let row = view.row(ny as usize).expect("row in bounds");
                for dx in -half..=half {
                    let nx = x + dx;
                    if nx < 0 || nx >= w as isize || row[nx as usize] == 0 {
                        all_set = false;
                        break 'probe;
                    }
                }
            }
            out[y as usize * w + x as usize] = if all_set { 255 } else { 0 };
        }
    }

    OwnedImage::new(out, w, h).expect("eroded buffer is exact")
}

/// Dilates with a `(2*half+1)` square structuring element.
pub(crate) fn dilate_rect(src: &OwnedImage, half: usize) -> OwnedImage {
    let view = src.view();
    let (w, h) = (view.width(), view.height());
    let half = half as isize;
    let mut out = vec![0u8; w * h];

    for y in 0..h as isize {
        for x in 0..w as isize {
            let mut any_set = false;
            'probe: for dy in -half..=half {
                let ny = y + dy;
                if ny < 0 || ny >= h as isize {
                    continue;
                }
                let row = view.row(ny as usize).expect("row in bounds");
                for dx in -half..=half {
                    let nx = x + dx;
                    if nx >= 0 && nx < w as isize && row[nx as usize] != 0 {
                        any_set = true;
                        break 'probe;
                    }
                }
            }
            out[y as usize * w + x as usize] = if any_set { 255 } else { 0 };
        }
    }

    OwnedImage::new(out, w, h).expect("dilated buffer is exact")
}

/// Opening pass (erode then dilate): suppresses speck noise.
pub(crate) fn open_rect(src: &OwnedImage, half: usize) -> OwnedImage {
    dilate_rect(&erode_rect(src, half), half)
}

/// Closing pass (dilate then erode): fills pinholes.
pub(crate) fn close_rect(src: &OwnedImage, half: usize) -> OwnedImage {
    erode_rect(&dilate_rect(src, half), half)
}

/// Sobel gradient magnitude, `|gx| + |gy|` saturated to `u8`.
///
/// Border samples clamp to the nearest pixel, so a uniform image produces a
/// zero response everywhere including the frame.
pub(crate) fn sobel_magnitude(src: &OwnedImage) -> OwnedImage {
    let view = src.view();
    let (w, h) = (view.width() as i64, view.height() as i64);
    let mut out = vec![0u8; src.width() * src.height()];

    let at = |x: i64, y: i64| -> i32 { i32::from(view.sample_clamped(x, y)) };

    for y in 0..h {
        for x in 0..w {
            let gx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
            let mag = gx.unsigned_abs() + gy.unsigned_abs();
            out[(y * w + x) as usize] = mag.min(255) as u8;
        }
    }

    OwnedImage::new(out, src.width(), src.height()).expect("gradient buffer is exact")
}
