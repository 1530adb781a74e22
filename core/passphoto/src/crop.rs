use image::imageops::FilterType;
use image::RgbaImage;
use log::debug;

use crate::canvas::check_surface;
use crate::error::PassportError;
use crate::face_detector::FaceBox;
use crate::face_locator::FaceLocator;

/// Passport aspect ratio (width / height) used when none is given: 3.5 × 4.5.
pub const DEFAULT_ASPECT_RATIO: f64 = 3.5 / 4.5;

/// Width of every cropped passport photo, in pixels.
pub const OUTPUT_WIDTH: u32 = 600;

/// Face height as a fraction of the crop height.
const FACE_HEIGHT_RATIO: f64 = 0.5;

/// Space above the face band as a fraction of the crop height.
const FACE_TOP_MARGIN: f64 = 0.15;

/// Crop window within the source image, in (fractional) source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Crop region snapped to whole source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, >= 1 unless the source is empty.
    pub width: u32,
    /// Height, >= 1 unless the source is empty.
    pub height: u32,
}

impl CropWindow {
    /// Snap to whole pixels inside a `source_width` × `source_height` image.
    ///
    /// An empty source gives an empty region on that axis.
    pub fn to_region(&self, source_width: u32, source_height: u32) -> CropRegion {
        let snap = |start: f64, len: f64, bound: u32| {
            let start = (start.round().max(0.0) as u32).min(bound.saturating_sub(1));
            let len = (len.round() as u32).max(1).min(bound - start);
            (start, len)
        };
        let (x, width) = snap(self.x, self.width, source_width);
        let (y, height) = snap(self.y, self.height, source_height);
        CropRegion {
            x,
            y,
            width,
            height,
        }
    }
}

fn validate_aspect_ratio(aspect_ratio: f64) -> Result<(), PassportError> {
    if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        Ok(())
    } else {
        Err(PassportError::InvalidAspectRatio(aspect_ratio))
    }
}

/// Pixel size of the cropped photo: `600 × round(600 / aspect_ratio)`.
pub fn output_dimensions(aspect_ratio: f64) -> Result<(u32, u32), PassportError> {
    validate_aspect_ratio(aspect_ratio)?;
    let height = (OUTPUT_WIDTH as f64 / aspect_ratio).round();
    if height < 1.0 || height > u32::MAX as f64 {
        return Err(PassportError::InvalidAspectRatio(aspect_ratio));
    }
    Ok((OUTPUT_WIDTH, height as u32))
}

/// Compute the crop window that frames `face` as a passport photo.
///
/// The face fills half the crop height with its centre 40% down from the
/// top. The window is translated (never distorted) to stay inside the image;
/// if it is still larger than the image it is shrunk, first to the image
/// width and then, if the height still overflows, to the image height with
/// the window re-centred horizontally. In that last case the face framing is
/// no longer exact.
pub fn passport_crop_window(
    face: &FaceBox,
    image_width: u32,
    image_height: u32,
    aspect_ratio: f64,
) -> CropWindow {
    let (img_w, img_h) = (image_width as f64, image_height as f64);

    let crop_h = face.height / FACE_HEIGHT_RATIO;
    let crop_w = crop_h * aspect_ratio;

    let target_face_center_y = crop_h * (FACE_TOP_MARGIN + FACE_HEIGHT_RATIO / 2.0);
    let mut x = face.center_x() - crop_w / 2.0;
    let mut y = face.center_y() - target_face_center_y;

    x = x.min(img_w - crop_w).max(0.0);
    y = y.min(img_h - crop_h).max(0.0);

    let (mut width, mut height) = (crop_w, crop_h);
    if width > img_w {
        width = img_w;
        height = img_w / aspect_ratio;
        x = 0.0;
    }
    if height > img_h {
        height = img_h;
        width = img_h * aspect_ratio;
        y = 0.0;
        x = ((img_w - width) / 2.0).max(0.0);
    }

    CropWindow {
        x,
        y,
        width,
        height,
    }
}

/// Crop `image` around its dominant face to `aspect_ratio` and scale the
/// result to [`OUTPUT_WIDTH`] × `round(OUTPUT_WIDTH / aspect_ratio)`.
pub fn crop_to_passport(
    image: &RgbaImage,
    locator: &FaceLocator,
    aspect_ratio: f64,
) -> Result<RgbaImage, PassportError> {
    let (out_w, out_h) = output_dimensions(aspect_ratio)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PassportError::ZeroDimensions);
    }

    let face = locator.locate(image).ok_or(PassportError::FaceNotDetected)?;
    let window = passport_crop_window(&face, image.width(), image.height(), aspect_ratio);
    let region = window.to_region(image.width(), image.height());
    debug!("face {face:?} -> crop {region:?} -> {out_w}x{out_h}");

    check_surface(out_w, out_h)?;
    let source = image::imageops::crop_imm(image, region.x, region.y, region.width, region.height)
        .to_image();
    Ok(image::imageops::resize(&source, out_w, out_h, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn face(x: f64, y: f64, width: f64, height: f64) -> FaceBox {
        FaceBox {
            x,
            y,
            width,
            height,
        }
    }

    fn assert_window(actual: CropWindow, x: f64, y: f64, width: f64, height: f64) {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
        assert!(
            close(actual.x, x)
                && close(actual.y, y)
                && close(actual.width, width)
                && close(actual.height, height),
            "got {actual:?}, expected ({x}, {y}, {width}, {height})"
        );
    }

    #[test]
    fn centered_face_is_framed() {
        // crop 300x400; face centre (500, 300) sits 160px (40%) below the top.
        let w = passport_crop_window(&face(400.0, 200.0, 200.0, 200.0), 1000, 1000, 0.75);
        assert_window(w, 350.0, 140.0, 300.0, 400.0);
    }

    #[test]
    fn window_is_translated_into_bounds() {
        let w = passport_crop_window(&face(0.0, 0.0, 100.0, 100.0), 1000, 1000, 0.75);
        assert_window(w, 0.0, 0.0, 150.0, 200.0);

        let w = passport_crop_window(&face(900.0, 900.0, 100.0, 100.0), 1000, 1000, 0.75);
        assert_window(w, 850.0, 800.0, 150.0, 200.0);
    }

    #[test]
    fn too_wide_window_is_shrunk_to_image_width() {
        // crop would be 300x400 in a 200px wide image.
        let w = passport_crop_window(&face(50.0, 100.0, 100.0, 200.0), 200, 1000, 0.75);
        assert_window(w, 0.0, 40.0, 200.0, 200.0 / 0.75);
    }

    #[test]
    fn too_tall_window_is_shrunk_and_recentered() {
        let w = passport_crop_window(&face(100.0, 50.0, 200.0, 200.0), 1000, 300, 0.75);
        assert_window(w, 387.5, 0.0, 225.0, 300.0);
    }

    #[test]
    fn width_then_height_constraint() {
        // crop 140x180 in a 100x100 image: width first gives 100x128.6, still too tall.
        let w = passport_crop_window(&face(10.0, 5.0, 80.0, 90.0), 100, 100, 140.0 / 180.0);
        let width = 100.0 * 140.0 / 180.0;
        assert_window(w, (100.0 - width) / 2.0, 0.0, width, 100.0);
    }

    #[test]
    fn output_dimensions_follow_aspect_ratio() {
        assert_eq!(output_dimensions(DEFAULT_ASPECT_RATIO).unwrap(), (600, 771));
        assert_eq!(output_dimensions(1.0).unwrap(), (600, 600));
        assert_eq!(output_dimensions(2.0).unwrap(), (600, 300));
        assert!(output_dimensions(0.0).is_err());
        assert!(output_dimensions(f64::NAN).is_err());
        assert!(output_dimensions(-1.0).is_err());
    }

    #[test]
    fn region_stays_inside_image() {
        let window = CropWindow {
            x: 99.6,
            y: -0.2,
            width: 10.0,
            height: 500.0,
        };
        let region = window.to_region(100, 100);
        assert_eq!(
            region,
            CropRegion {
                x: 99,
                y: 0,
                width: 1,
                height: 100
            }
        );
    }

    #[test]
    fn empty_source_gives_empty_region() {
        let window = CropWindow {
            x: 3.0,
            y: 2.0,
            width: 10.0,
            height: 10.0,
        };
        let region = window.to_region(0, 50);
        assert_eq!((region.x, region.width), (0, 0));
        assert_eq!((region.y, region.height), (2, 10));
        assert_eq!(window.to_region(0, 0).height, 0);
    }

    #[test]
    fn crop_output_shape_is_fixed() {
        let locator = FaceLocator::Heuristic;
        for &(w, h) in &[(640, 480), (480, 640), (50, 2000), (2000, 50), (1, 1)] {
            let img = RgbaImage::from_pixel(w, h, Rgba([90, 120, 150, 255]));
            for &ratio in &[DEFAULT_ASPECT_RATIO, 1.0, 2.0 / 3.0] {
                let out = crop_to_passport(&img, &locator, ratio).unwrap();
                let expected = output_dimensions(ratio).unwrap();
                assert_eq!(out.dimensions(), expected, "{w}x{h} @ {ratio}");
            }
        }
    }

    #[test]
    fn huge_output_is_a_canvas_error() {
        let img = RgbaImage::new(10, 10);
        let result = crop_to_passport(&img, &FaceLocator::Heuristic, 1e-6);
        assert!(matches!(result, Err(PassportError::Canvas(_))));
    }
}
