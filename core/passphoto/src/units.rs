use serde::{Deserialize, Serialize};

use crate::error::PassportError;

/// Pixel density used for on-screen sheet previews.
pub const PREVIEW_DPI: u32 = 96;

/// Pixel density used for print-ready exports.
pub const PRINT_DPI: u32 = 300;

const CM_PER_INCH: f64 = 2.54;

/// Physical length unit of a [`PhysicalSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Centimetres.
    Cm,
    /// Inches.
    Inch,
}

/// Convert centimetres to whole pixels at `dpi` (nearest, ties away from zero).
pub fn cm_to_pixels(cm: f64, dpi: u32) -> u32 {
    (cm * dpi as f64 / CM_PER_INCH).round() as u32
}

/// Convert inches to whole pixels at `dpi` (nearest, ties away from zero).
pub fn inch_to_pixels(inch: f64, dpi: u32) -> u32 {
    (inch * dpi as f64).round() as u32
}

/// Convert a length in `unit` to whole pixels at `dpi`.
pub fn to_pixels(value: f64, unit: Unit, dpi: u32) -> u32 {
    match unit {
        Unit::Cm => cm_to_pixels(value, dpi),
        Unit::Inch => inch_to_pixels(value, dpi),
    }
}

/// A width × height measured in a physical unit.
///
/// Used for both photo sizes (e.g. 3.5 × 4.5 cm) and paper sizes
/// (e.g. A4, 29.7 × 21 cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    /// Horizontal extent in `unit`.
    pub width: f64,
    /// Vertical extent in `unit`.
    pub height: f64,
    /// Unit of `width` and `height`.
    pub unit: Unit,
}

impl PhysicalSize {
    /// Size in centimetres.
    pub const fn cm(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            unit: Unit::Cm,
        }
    }

    /// Size in inches.
    pub const fn inch(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            unit: Unit::Inch,
        }
    }

    /// Width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Reject non-finite or non-positive extents.
    pub fn validate(&self) -> Result<(), PassportError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(PassportError::InvalidPhysicalSize)
        }
    }

    /// Pixel dimensions at `dpi`.
    pub fn to_pixels(&self, dpi: u32) -> (u32, u32) {
        (
            to_pixels(self.width, self.unit, dpi),
            to_pixels(self.height, self.unit, dpi),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_inch_in_cm_is_dpi_pixels() {
        assert_eq!(cm_to_pixels(2.54, 300), 300);
        assert_eq!(cm_to_pixels(2.54, 96), 96);
    }

    #[test]
    fn inch_conversion_is_exact() {
        assert_eq!(inch_to_pixels(1.0, 96), 96);
        assert_eq!(inch_to_pixels(8.5, 300), 2550);
    }

    #[test]
    fn cm_conversion_rounds_to_nearest() {
        // 29.7 * 96 / 2.54 = 1122.52
        assert_eq!(cm_to_pixels(29.7, 96), 1123);
        // 21 * 96 / 2.54 = 793.70
        assert_eq!(cm_to_pixels(21.0, 96), 794);
        // 0.3 * 96 / 2.54 = 11.34
        assert_eq!(cm_to_pixels(0.3, 96), 11);
    }

    #[test]
    fn physical_size_to_pixels() {
        let photo = PhysicalSize::cm(3.5, 4.5);
        assert_eq!(photo.to_pixels(PREVIEW_DPI), (132, 170));
        assert_eq!(photo.to_pixels(PRINT_DPI), (413, 531));

        let us = PhysicalSize::inch(2.0, 2.0);
        assert_eq!(us.to_pixels(PRINT_DPI), (600, 600));
    }

    #[test]
    fn validate_rejects_degenerate_sizes() {
        assert!(PhysicalSize::cm(3.5, 4.5).validate().is_ok());
        assert!(PhysicalSize::cm(0.0, 4.5).validate().is_err());
        assert!(PhysicalSize::inch(-1.0, 2.0).validate().is_err());
        assert!(PhysicalSize::inch(f64::NAN, 2.0).validate().is_err());
    }

    #[test]
    fn aspect_ratio_is_width_over_height() {
        let photo = PhysicalSize::cm(3.5, 4.5);
        assert!((photo.aspect_ratio() - 3.5 / 4.5).abs() < 1e-12);
    }
}
