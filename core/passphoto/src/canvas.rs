use image::{Rgba, RgbaImage};

use crate::error::PassportError;

/// Largest width or height of any surface this crate renders onto.
pub const MAX_CANVAS_DIMENSION: u32 = 32_767;

/// Largest pixel count of any surface this crate renders onto.
pub const MAX_CANVAS_PIXELS: u64 = 268_435_456;

/// Check that a `width` × `height` surface can be allocated.
pub(crate) fn check_surface(width: u32, height: u32) -> Result<(), PassportError> {
    if width == 0 || height == 0 {
        return Err(PassportError::Canvas(format!("{width}x{height} surface is empty")));
    }
    if width > MAX_CANVAS_DIMENSION
        || height > MAX_CANVAS_DIMENSION
        || width as u64 * height as u64 > MAX_CANVAS_PIXELS
    {
        return Err(PassportError::Canvas(format!(
            "{width}x{height} exceeds the maximum surface size"
        )));
    }
    Ok(())
}

/// Allocate a `width` × `height` surface filled with `fill`.
///
/// Fails with [`PassportError::Canvas`] instead of aborting on absurd sizes.
pub(crate) fn new_canvas(
    width: u32,
    height: u32,
    fill: Rgba<u8>,
) -> Result<RgbaImage, PassportError> {
    check_surface(width, height)?;
    Ok(RgbaImage::from_pixel(width, height, fill))
}
