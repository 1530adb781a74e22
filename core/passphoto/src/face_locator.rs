use image::RgbaImage;
use log::{debug, warn};

use crate::face_detector::{FaceBounds, FaceBox, FaceDetector};

/// Heuristic face width as a fraction of image width.
const HEURISTIC_WIDTH: f64 = 0.4;
/// Heuristic face height as a fraction of image height.
const HEURISTIC_HEIGHT: f64 = 0.35;
/// Heuristic distance of the face top from the image top, as a fraction of height.
const HEURISTIC_TOP: f64 = 0.1;

/// Finds the dominant face in an image.
///
/// `Platform` delegates to a real detector and drops to the heuristic only
/// when that detector errors. `Heuristic` is used when no detector is
/// available at all; it never fails.
#[derive(Default)]
pub enum FaceLocator {
    /// A platform face-detection capability.
    Platform(Box<dyn FaceDetector>),
    /// Upper-centre guess used when no detector is available.
    #[default]
    Heuristic,
}

impl FaceLocator {
    /// Pick the variant from a capability probe result.
    pub fn from_capability(detector: Option<Box<dyn FaceDetector>>) -> Self {
        match detector {
            Some(detector) => FaceLocator::Platform(detector),
            None => FaceLocator::Heuristic,
        }
    }

    /// Wrap a platform detector.
    pub fn platform(detector: Box<dyn FaceDetector>) -> Self {
        FaceLocator::Platform(detector)
    }

    /// Locate the dominant face.
    ///
    /// Returns `None` only when a working platform detector reports no face.
    pub fn locate(&self, image: &RgbaImage) -> Option<FaceBox> {
        match self {
            FaceLocator::Heuristic => Some(heuristic_face_box(image.width(), image.height())),
            FaceLocator::Platform(detector) => {
                let gray = image::imageops::grayscale(image);
                match detector.detect(gray.as_raw(), gray.width(), gray.height()) {
                    Ok(faces) => {
                        // Highest confidence wins; ties keep the detector's order.
                        let best = faces.iter().fold(
                            None::<&FaceBounds>,
                            |best: Option<&FaceBounds>, face| match best {
                                Some(b) if b.confidence >= face.confidence => Some(b),
                                _ => Some(face),
                            },
                        )?;
                        let face = FaceBox::clipped(best, image.width(), image.height());
                        debug!("platform detector found {} face(s), using {:?}", faces.len(), face);
                        face
                    }
                    Err(e) => {
                        warn!("face detector failed, using heuristic box: {e}");
                        Some(heuristic_face_box(image.width(), image.height()))
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for FaceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceLocator::Platform(_) => f.write_str("FaceLocator::Platform(..)"),
            FaceLocator::Heuristic => f.write_str("FaceLocator::Heuristic"),
        }
    }
}

/// Deterministic face guess: 40% × 35% of the image, horizontally centred,
/// 10% of the height down from the top.
pub fn heuristic_face_box(width: u32, height: u32) -> FaceBox {
    let (w, h) = (width as f64, height as f64);
    let face_width = w * HEURISTIC_WIDTH;
    let face_height = h * HEURISTIC_HEIGHT;
    FaceBox {
        x: (w - face_width) / 2.0,
        y: h * HEURISTIC_TOP,
        width: face_width,
        height: face_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PassportError;

    struct Fixed(Vec<FaceBounds>);

    impl FaceDetector for Fixed {
        fn detect(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<FaceBounds>, PassportError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl FaceDetector for Broken {
        fn detect(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<FaceBounds>, PassportError> {
            Err(PassportError::Detector("model not loaded".into()))
        }
    }

    fn face(x: f64, confidence: f64) -> FaceBounds {
        FaceBounds {
            x,
            y: 10.0,
            width: 20.0,
            height: 20.0,
            confidence,
        }
    }

    #[test]
    fn heuristic_box_geometry() {
        let b = heuristic_face_box(200, 400);
        assert_eq!(b.width, 80.0);
        assert_eq!(b.height, 140.0);
        assert_eq!(b.x, 60.0);
        assert_eq!(b.y, 40.0);
    }

    #[test]
    fn heuristic_box_is_contained_for_many_sizes() {
        for &(w, h) in &[(1, 1), (3, 7), (640, 480), (480, 640), (10_000, 3), (1, 9_999)] {
            let b = heuristic_face_box(w, h);
            assert!(b.x >= 0.0 && b.y >= 0.0, "{w}x{h}");
            assert!(b.x + b.width <= w as f64, "{w}x{h}");
            assert!(b.y + b.height <= h as f64, "{w}x{h}");
            assert!(b.width > 0.0 && b.height > 0.0, "{w}x{h}");
        }
    }

    #[test]
    fn no_detector_uses_heuristic() {
        let img = RgbaImage::new(100, 100);
        let locator = FaceLocator::from_capability(None);
        assert_eq!(locator.locate(&img), Some(heuristic_face_box(100, 100)));
    }

    #[test]
    fn detector_error_falls_back_to_heuristic() {
        let img = RgbaImage::new(100, 50);
        let locator = FaceLocator::platform(Box::new(Broken));
        assert_eq!(locator.locate(&img), Some(heuristic_face_box(100, 50)));
    }

    #[test]
    fn detector_with_no_faces_returns_none() {
        let img = RgbaImage::new(100, 100);
        let locator = FaceLocator::platform(Box::new(Fixed(vec![])));
        assert_eq!(locator.locate(&img), None);
    }

    #[test]
    fn highest_confidence_face_wins() {
        let img = RgbaImage::new(100, 100);
        let locator = FaceLocator::platform(Box::new(Fixed(vec![face(5.0, 1.0), face(50.0, 3.0)])));
        assert_eq!(locator.locate(&img).unwrap().x, 50.0);
    }

    #[test]
    fn equal_confidence_keeps_first_detection() {
        let img = RgbaImage::new(100, 100);
        let faces = vec![face(5.0, 2.0), face(50.0, 2.0), face(30.0, 1.0)];
        let locator = FaceLocator::platform(Box::new(Fixed(faces)));
        assert_eq!(locator.locate(&img).unwrap().x, 5.0);
    }

    #[test]
    fn detection_is_clipped_to_image() {
        let img = RgbaImage::new(60, 100);
        let locator = FaceLocator::platform(Box::new(Fixed(vec![face(50.0, 1.0)])));
        let b = locator.locate(&img).unwrap();
        assert_eq!(b.x + b.width, 60.0);
    }
}
