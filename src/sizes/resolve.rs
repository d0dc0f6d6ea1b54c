//! Aspect-fit-then-constrain sizing for sources without a native pixel grid.
//!
//! A raster resizer computes the output box from the source's pixel size. A vector source can be
//! rendered at any size, so the box is derived from the *ratio* between the target and the
//! fullsize rasterization instead, and that same ratio is later applied to the document's
//! declared geometry.

use crate::foundation::core::{Dims, FullsizeDims};
use crate::foundation::error::{SvgPngError, SvgPngResult};
use crate::sizes::catalog::SizeSpec;

/// Output of [`resolve`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedBox {
    /// Crop origin. Always `0`; cropping is left to the rasterizer.
    pub origin_x: u32,
    pub origin_y: u32,
    /// Final box after applying the size's own constraint.
    pub new_width: u32,
    pub new_height: u32,
    /// Fullsize dimensions scaled by `ratio`, truncated.
    pub orig_width: u32,
    pub orig_height: u32,
    /// Uniform scale to apply to the vector document's intrinsic geometry.
    pub ratio: f64,
}

impl ResolvedBox {
    pub fn new_dims(&self) -> Dims {
        Dims::new(self.new_width, self.new_height)
    }

    pub fn orig_dims(&self) -> Dims {
        Dims::new(self.orig_width, self.orig_height)
    }
}

/// Resolve the final pixel box and scale ratio for `size` against the fullsize raster.
///
/// A zero target axis never limits the ratio. When both axes are zero the size is fully
/// unconstrained and the ratio is `1.0`.
#[tracing::instrument(level = "debug")]
pub fn resolve(size: &SizeSpec, fullsize: FullsizeDims) -> SvgPngResult<ResolvedBox> {
    if fullsize.is_empty() {
        return Err(SvgPngError::InvalidFullsizeDimensions {
            width: fullsize.width,
            height: fullsize.height,
        });
    }

    let ratio_w = axis_ratio(size.width, fullsize.width);
    let ratio_h = axis_ratio(size.height, fullsize.height);
    let mut ratio = ratio_w.min(ratio_h);
    if !ratio.is_finite() {
        ratio = 1.0;
    }

    let orig_w = f64::from(fullsize.width) * ratio;
    let orig_h = f64::from(fullsize.height) * ratio;

    let (new_width, new_height) = if size.crop {
        fill_dimensions(orig_w, orig_h, size.width, size.height)
    } else {
        constrain_dimensions(orig_w, orig_h, size.width, size.height)
    };

    Ok(ResolvedBox {
        origin_x: 0,
        origin_y: 0,
        new_width,
        new_height,
        orig_width: orig_w as u32,
        orig_height: orig_h as u32,
        ratio,
    })
}

fn axis_ratio(target: u32, full: u32) -> f64 {
    if target == 0 {
        f64::INFINITY
    } else {
        f64::from(target) / f64::from(full)
    }
}

fn round_px(v: f64) -> i64 {
    v.round() as i64
}

/// Shrink `(current_w, current_h)` to fit within `(max_w, max_h)`, preserving aspect ratio.
///
/// Never enlarges. A zero max leaves that axis alone. Results are at least 1px, and a
/// dimension that was limited snaps to its max when rounding lands one pixel short.
pub fn constrain_dimensions(current_w: f64, current_h: f64, max_w: u32, max_h: u32) -> (u32, u32) {
    if max_w == 0 && max_h == 0 {
        return (current_w as u32, current_h as u32);
    }

    let max_w_i = i64::from(max_w);
    let max_h_i = i64::from(max_h);

    let mut width_ratio = 1.0;
    let mut height_ratio = 1.0;
    let mut did_width = false;
    let mut did_height = false;

    if max_w > 0 && current_w > 0.0 && current_w > f64::from(max_w) {
        width_ratio = f64::from(max_w) / current_w;
        did_width = true;
    }
    if max_h > 0 && current_h > 0.0 && current_h > f64::from(max_h) {
        height_ratio = f64::from(max_h) / current_h;
        did_height = true;
    }

    let smaller = f64::min(width_ratio, height_ratio);
    let larger = f64::max(width_ratio, height_ratio);

    let ratio = if round_px(current_w * larger) > max_w_i || round_px(current_h * larger) > max_h_i
    {
        smaller
    } else {
        larger
    };

    let mut w = round_px(current_w * ratio).max(1);
    let mut h = round_px(current_h * ratio).max(1);

    if did_width && w == max_w_i - 1 {
        w = max_w_i;
    }
    if did_height && h == max_h_i - 1 {
        h = max_h_i;
    }

    (clamp_px(w), clamp_px(h))
}

/// Cover `(max_w, max_h)` with `(current_w, current_h)`: every constrained axis becomes exactly
/// its max and an unconstrained axis follows the cover ratio. The excess is cropped downstream.
pub fn fill_dimensions(current_w: f64, current_h: f64, max_w: u32, max_h: u32) -> (u32, u32) {
    if current_w <= 0.0 || current_h <= 0.0 {
        return (max_w.max(1), max_h.max(1));
    }

    let cover = [(max_w, current_w), (max_h, current_h)]
        .into_iter()
        .filter(|&(max, _)| max > 0)
        .map(|(max, cur)| f64::from(max) / cur)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))));

    let Some(cover) = cover else {
        return (current_w as u32, current_h as u32);
    };

    let w = if max_w > 0 {
        max_w
    } else {
        clamp_px(round_px(current_w * cover).max(1))
    };
    let h = if max_h > 0 {
        max_h
    } else {
        clamp_px(round_px(current_h * cover).max(1))
    };
    (w, h)
}

fn clamp_px(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/sizes/resolve.rs"]
mod tests;
