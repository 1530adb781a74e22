//! Foreground/background segmentation.
//!
//! The model itself is an external capability behind [`SegmentationModel`];
//! this module bounds the working resolution, validates what the model
//! returns and turns it into an [`AlphaMask`] where `1.0` always means
//! "keep as foreground".

use image::imageops::FilterType;
use image::{RgbImage, RgbaImage};
use log::debug;

use crate::error::PassportError;

/// Largest width or height fed to a segmentation model.
pub const MAX_WORKING_DIMENSION: u32 = 1024;

/// Per-pixel foreground confidence in `[0, 1]`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl AlphaMask {
    /// Build a mask from row-major values, clamped to `[0, 1]`.
    ///
    /// Fails if `data` does not hold exactly `width * height` finite values.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, PassportError> {
        let expected = width as usize * height as usize;
        if expected == 0 || data.len() != expected {
            return Err(PassportError::Segmentation(format!(
                "expected {expected} mask values for {width}x{height}, got {}",
                data.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(PassportError::Segmentation(
                "mask contains non-finite values".into(),
            ));
        }
        let data = data.into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A mask with the same value everywhere.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value.clamp(0.0, 1.0); width as usize * height as usize],
        }
    }

    /// Read the alpha channel of an RGBA image as a mask.
    pub fn from_alpha(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|p| p.0[3] as f32 / 255.0).collect(),
        }
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// If `(x, y)` is outside the mask.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside mask");
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Row-major values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Which class a model's confidence values refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskKind {
    /// `1.0` means subject.
    #[default]
    Foreground,
    /// `1.0` means background; inverted before use.
    Background,
}

/// Raw model output: one confidence per pixel of the image it was given.
#[derive(Debug, Clone)]
pub struct Confidence {
    /// Row-major confidences.
    pub data: Vec<f32>,
    /// What the confidences measure.
    pub kind: MaskKind,
}

/// Pluggable semantic segmentation backend.
///
/// Implementations receive the image at working resolution and must return
/// exactly one confidence per pixel.
pub trait SegmentationModel: Send + Sync {
    /// Run inference.
    fn infer(&self, image: &RgbImage) -> Result<Confidence, PassportError>;
}

/// Confidences computed elsewhere (for example by a model running in the
/// browser) and handed in as plain numbers.
#[derive(Debug, Clone)]
pub struct PrecomputedSegmentation {
    width: u32,
    height: u32,
    confidence: Confidence,
}

impl PrecomputedSegmentation {
    /// Wrap confidences computed for a `width` × `height` working image.
    pub fn new(width: u32, height: u32, data: Vec<f32>, kind: MaskKind) -> Self {
        Self {
            width,
            height,
            confidence: Confidence { data, kind },
        }
    }
}

impl SegmentationModel for PrecomputedSegmentation {
    fn infer(&self, image: &RgbImage) -> Result<Confidence, PassportError> {
        if image.dimensions() != (self.width, self.height) {
            return Err(PassportError::Segmentation(format!(
                "precomputed mask is {}x{} but working image is {}x{}",
                self.width,
                self.height,
                image.width(),
                image.height()
            )));
        }
        Ok(self.confidence.clone())
    }
}

/// A foreground cutout: the working-resolution image with its mask.
///
/// `image`'s alpha channel carries the mask quantised to 8 bits; `mask`
/// keeps full precision. Retain this pair to change backgrounds without
/// segmenting again.
#[derive(Debug, Clone)]
pub struct Cutout {
    /// Working-resolution RGBA image.
    pub image: RgbaImage,
    /// Foreground mask aligned with `image`.
    pub mask: AlphaMask,
}

impl Cutout {
    /// Pair an image with a mask of the same size.
    pub fn new(image: RgbaImage, mask: AlphaMask) -> Result<Self, PassportError> {
        if image.dimensions() != (mask.width(), mask.height()) {
            return Err(PassportError::MaskMismatch {
                mask_width: mask.width(),
                mask_height: mask.height(),
                image_width: image.width(),
                image_height: image.height(),
            });
        }
        Ok(Self { image, mask })
    }
}

/// Dimensions after bounding the longer side to [`MAX_WORKING_DIMENSION`].
pub fn working_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_WORKING_DIMENSION && height <= MAX_WORKING_DIMENSION {
        return (width, height);
    }
    let max = MAX_WORKING_DIMENSION as f64;
    if width > height {
        let h = (height as f64 * max / width as f64).round() as u32;
        (MAX_WORKING_DIMENSION, h.max(1))
    } else {
        let w = (width as f64 * max / height as f64).round() as u32;
        (w.max(1), MAX_WORKING_DIMENSION)
    }
}

/// Segment `image` into a [`Cutout`] at working resolution.
///
/// The returned cutout may be smaller than `image`; compositing happens at
/// that size.
pub fn segment(
    image: &RgbaImage,
    model: &dyn SegmentationModel,
) -> Result<Cutout, PassportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PassportError::ZeroDimensions);
    }

    let (work_w, work_h) = working_dimensions(image.width(), image.height());
    let working = if (work_w, work_h) == image.dimensions() {
        image.clone()
    } else {
        debug!(
            "downsizing {}x{} to {work_w}x{work_h} for segmentation",
            image.width(),
            image.height()
        );
        image::imageops::resize(image, work_w, work_h, FilterType::Triangle)
    };

    let rgb = image::DynamicImage::ImageRgba8(working.clone()).to_rgb8();
    let confidence = model.infer(&rgb)?;
    if confidence.data.is_empty() {
        return Err(PassportError::Segmentation("model returned an empty mask".into()));
    }

    let values = match confidence.kind {
        MaskKind::Foreground => confidence.data,
        MaskKind::Background => confidence.data.into_iter().map(|v| 1.0 - v).collect(),
    };
    let mask = AlphaMask::new(work_w, work_h, values)?;

    let mut cutout = working;
    for (pixel, alpha) in cutout.pixels_mut().zip(mask.as_slice()) {
        pixel.0[3] = (alpha * 255.0).round() as u8;
    }
    Cutout::new(cutout, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Marks the left half of the image as foreground.
    struct LeftHalf(MaskKind);

    impl SegmentationModel for LeftHalf {
        fn infer(&self, image: &RgbImage) -> Result<Confidence, PassportError> {
            let half = image.width() / 2;
            let data = image
                .enumerate_pixels()
                .map(|(x, _, _)| {
                    let fg = x < half;
                    match self.0 {
                        MaskKind::Foreground => fg as u8 as f32,
                        MaskKind::Background => (!fg) as u8 as f32,
                    }
                })
                .collect();
            Ok(Confidence {
                data,
                kind: self.0,
            })
        }
    }

    struct Empty;

    impl SegmentationModel for Empty {
        fn infer(&self, _: &RgbImage) -> Result<Confidence, PassportError> {
            Ok(Confidence {
                data: vec![],
                kind: MaskKind::Foreground,
            })
        }
    }

    struct Short;

    impl SegmentationModel for Short {
        fn infer(&self, _: &RgbImage) -> Result<Confidence, PassportError> {
            Ok(Confidence {
                data: vec![1.0; 3],
                kind: MaskKind::Foreground,
            })
        }
    }

    #[test]
    fn small_images_keep_their_size() {
        assert_eq!(working_dimensions(1024, 1024), (1024, 1024));
        assert_eq!(working_dimensions(300, 200), (300, 200));
    }

    #[test]
    fn large_images_are_bounded() {
        assert_eq!(working_dimensions(2048, 1536), (1024, 768));
        assert_eq!(working_dimensions(1536, 2048), (768, 1024));
        assert_eq!(working_dimensions(3000, 3000), (1024, 1024));
        // 1000 * 1024 / 3000 = 341.33
        assert_eq!(working_dimensions(3000, 1000), (1024, 341));
        assert_eq!(working_dimensions(100_000, 10), (1024, 1));
    }

    #[test]
    fn foreground_mask_is_used_as_is() {
        let img = RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]));
        let cutout = segment(&img, &LeftHalf(MaskKind::Foreground)).unwrap();
        assert_eq!(cutout.mask.get(0, 0), 1.0);
        assert_eq!(cutout.mask.get(7, 3), 0.0);
        assert_eq!(cutout.image.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(cutout.image.get_pixel(7, 0).0[3], 0);
    }

    #[test]
    fn background_mask_is_inverted() {
        let img = RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]));
        let cutout = segment(&img, &LeftHalf(MaskKind::Background)).unwrap();
        assert_eq!(cutout.mask.get(0, 0), 1.0);
        assert_eq!(cutout.mask.get(7, 0), 0.0);
    }

    #[test]
    fn mask_is_aligned_to_working_resolution() {
        let img = RgbaImage::new(2048, 1024);
        let cutout = segment(&img, &LeftHalf(MaskKind::Foreground)).unwrap();
        assert_eq!(cutout.image.dimensions(), (1024, 512));
        assert_eq!((cutout.mask.width(), cutout.mask.height()), (1024, 512));
    }

    #[test]
    fn malformed_output_is_a_segmentation_error() {
        let img = RgbaImage::new(4, 4);
        assert!(matches!(
            segment(&img, &Empty),
            Err(PassportError::Segmentation(_))
        ));
        assert!(matches!(
            segment(&img, &Short),
            Err(PassportError::Segmentation(_))
        ));
    }

    #[test]
    fn precomputed_mask_must_match_working_size() {
        let img = RgbaImage::new(4, 2);
        let ok = PrecomputedSegmentation::new(4, 2, vec![0.5; 8], MaskKind::Foreground);
        let cutout = segment(&img, &ok).unwrap();
        assert_eq!(cutout.image.get_pixel(3, 1).0[3], 128);

        let wrong = PrecomputedSegmentation::new(2, 4, vec![0.5; 8], MaskKind::Foreground);
        assert!(segment(&img, &wrong).is_err());
    }

    #[test]
    fn mask_values_are_clamped() {
        let mask = AlphaMask::new(2, 1, vec![-0.5, 1.5]).unwrap();
        assert_eq!(mask.as_slice(), &[0.0, 1.0]);
        assert!(AlphaMask::new(1, 1, vec![f32::NAN]).is_err());
    }

    #[test]
    fn cutout_rejects_mismatched_mask() {
        let img = RgbaImage::new(3, 3);
        let mask = AlphaMask::filled(2, 3, 1.0);
        assert!(matches!(
            Cutout::new(img, mask),
            Err(PassportError::MaskMismatch { .. })
        ));
    }
}
