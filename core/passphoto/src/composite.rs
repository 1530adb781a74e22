//! Place a foreground cutout on a solid background.
//!
//! A plain alpha blend leaves visible halos where the segmentation mask is
//! soft, so three ordered passes refine the edges after the blend:
//!
//! 1. edge smoothing of soft-edge pixels using their 8-neighbourhood,
//! 2. suppression of green or grey spill left over from the old background,
//! 3. feathering of the faintest outer fringe.
//!
//! Every pass reads the segmentation mask, never alpha values written by an
//! earlier pass, so the passes must run in this order over the whole image.

use image::RgbaImage;

use crate::color::Color;
use crate::error::PassportError;
use crate::segment::{AlphaMask, Cutout};

/// Mask values at or below this are background for pass 1.
const SOFT_EDGE_MIN: f32 = 0.02;
/// Mask values at or above this are foreground for pass 1.
const SOFT_EDGE_MAX: f32 = 0.98;
/// Weight of a pixel's own alpha in the smoothed alpha.
const OWN_ALPHA_WEIGHT: f32 = 0.7;
/// Weight of the 8-neighbour mean alpha in the smoothed alpha.
const NEIGHBOR_ALPHA_WEIGHT: f32 = 0.3;
/// Gamma applied to the smoothed alpha.
const EDGE_GAMMA: f32 = 0.85;

/// Spill pass only looks at mask values inside `(SPILL_MIN, SPILL_MAX)`.
const SPILL_MIN: f32 = 0.15;
const SPILL_MAX: f32 = 0.92;
/// Green must exceed red and blue by this factor to count as spill.
const GREEN_SPILL_RATIO: f32 = 1.1;
/// Channels within this distance of each other are "grey".
const GRAY_TOLERANCE: i16 = 20;
/// Grey spill is only corrected below this mask value.
const GRAY_SPILL_MAX_ALPHA: f32 = 0.5;
/// Fraction of the way a spilled pixel is pulled toward the background.
const SPILL_REDUCTION: f32 = 0.6;

/// Feather pass only looks at mask values inside `(FRINGE_MIN, FRINGE_MAX)`.
const FRINGE_MIN: f32 = 0.01;
const FRINGE_MAX: f32 = 0.12;
const FRINGE_BOOST: f32 = 3.0;

/// Composite a retained [`Cutout`] onto `background`.
pub fn composite_cutout(cutout: &Cutout, background: Color) -> Result<RgbaImage, PassportError> {
    composite(&cutout.image, &cutout.mask, background)
}

/// Composite `cutout` onto a solid `background` using `mask` as opacity.
///
/// The RGB channels of `cutout` are the foreground colours; its own alpha
/// channel is ignored in favour of `mask`. The result has the same size as
/// `cutout` and every pixel is fully opaque.
pub fn composite(
    cutout: &RgbaImage,
    mask: &AlphaMask,
    background: Color,
) -> Result<RgbaImage, PassportError> {
    let (width, height) = cutout.dimensions();
    if (mask.width(), mask.height()) != (width, height) {
        return Err(PassportError::MaskMismatch {
            mask_width: mask.width(),
            mask_height: mask.height(),
            image_width: width,
            image_height: height,
        });
    }
    if width == 0 || height == 0 {
        return Err(PassportError::ZeroDimensions);
    }

    let fg = cutout.as_raw();
    let alpha = mask.as_slice();
    let bg = [background.r as f32, background.g as f32, background.b as f32];
    let (w, h) = (width as usize, height as usize);

    // Plain source-over blend as the starting point.
    let mut out = vec![0u8; w * h * 4];
    for (i, &a) in alpha.iter().enumerate() {
        blend_into(&mut out, fg, i, a, bg);
    }

    // Pass 1: edge smoothing.
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let i = y * w + x;
            let a = alpha[i];
            if a >= SOFT_EDGE_MAX || a <= SOFT_EDGE_MIN {
                continue;
            }
            let neighbors = neighbor_mean(alpha, w, x, y);
            let blended = a * OWN_ALPHA_WEIGHT + neighbors * NEIGHBOR_ALPHA_WEIGHT;
            blend_into(&mut out, fg, i, blended.powf(EDGE_GAMMA), bg);
        }
    }

    // Pass 2: colour spill suppression, reading pass-1 colours.
    for y in 2..h.saturating_sub(2) {
        for x in 2..w.saturating_sub(2) {
            let i = y * w + x;
            let a = alpha[i];
            if a < SPILL_MIN || a > SPILL_MAX {
                continue;
            }
            let px = &mut out[i * 4..i * 4 + 3];
            let (r, g, b) = (px[0], px[1], px[2]);
            if is_greenish(r, g, b) || (is_grayish(r, g, b) && a < GRAY_SPILL_MAX_ALPHA) {
                for (c, target) in px.iter_mut().zip(bg) {
                    *c = to_channel(
                        *c as f32 * (1.0 - SPILL_REDUCTION) + target * SPILL_REDUCTION,
                    );
                }
            }
        }
    }

    // Pass 3: feather the faintest fringe over the whole image.
    for (i, &a) in alpha.iter().enumerate() {
        if a > FRINGE_MIN && a < FRINGE_MAX {
            blend_into(&mut out, fg, i, a * FRINGE_BOOST, bg);
        }
    }

    RgbaImage::from_raw(width, height, out)
        .ok_or_else(|| PassportError::Canvas(format!("{width}x{height} composite buffer")))
}

/// Write `fg * a + bg * (1 - a)` for pixel `i`, fully opaque.
fn blend_into(out: &mut [u8], fg: &[u8], i: usize, a: f32, bg: [f32; 3]) {
    let o = i * 4;
    for c in 0..3 {
        out[o + c] = to_channel(fg[o + c] as f32 * a + bg[c] * (1.0 - a));
    }
    out[o + 3] = 255;
}

fn neighbor_mean(alpha: &[f32], w: usize, x: usize, y: usize) -> f32 {
    let mut sum = 0.0;
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            if nx != x || ny != y {
                sum += alpha[ny * w + nx];
            }
        }
    }
    sum / 8.0
}

fn is_greenish(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    g > r * GREEN_SPILL_RATIO && g > b * GREEN_SPILL_RATIO
}

fn is_grayish(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    (r - g).abs() < GRAY_TOLERANCE
        && (g - b).abs() < GRAY_TOLERANCE
        && (r - b).abs() < GRAY_TOLERANCE
}

fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
