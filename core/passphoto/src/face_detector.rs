use crate::error::PassportError;

/// Bounding box of a detected face within an image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence score.
    pub confidence: f64,
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a platform face detector (SeetaFace,
/// ONNX, a browser `FaceDetector` result passed in from JS, ...) and hand it
/// to [`crate::FaceLocator::platform`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    ///
    /// An `Err` means the detector itself failed; the locator then falls
    /// back to the heuristic box. `Ok(vec![])` means "no face".
    fn detect(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceBounds>, PassportError>;
}

/// Axis-aligned face box in source-image pixels, clipped to the image.
///
/// Always has positive width and height and lies within
/// `[0, image_width] × [0, image_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width, > 0.
    pub width: f64,
    /// Height, > 0.
    pub height: f64,
}

impl FaceBox {
    /// Clip a raw detection to the image. Returns `None` when nothing of
    /// the detection remains inside the image.
    pub fn clipped(bounds: &FaceBounds, image_width: u32, image_height: u32) -> Option<Self> {
        let raw = [bounds.x, bounds.y, bounds.width, bounds.height];
        if !raw.iter().all(|v| v.is_finite()) {
            return None;
        }
        let (iw, ih) = (image_width as f64, image_height as f64);
        let x0 = bounds.x.max(0.0);
        let y0 = bounds.y.max(0.0);
        let x1 = (bounds.x + bounds.width).min(iw);
        let y1 = (bounds.y + bounds.height).min(ih);
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical centre.
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(x: f64, y: f64, width: f64, height: f64) -> FaceBounds {
        FaceBounds {
            x,
            y,
            width,
            height,
            confidence: 1.0,
        }
    }

    #[test]
    fn inside_box_is_unchanged() {
        let face = FaceBox::clipped(&bounds(10.0, 20.0, 30.0, 40.0), 100, 100).unwrap();
        assert_eq!(
            face,
            FaceBox {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0
            }
        );
        assert_eq!(face.center_x(), 25.0);
        assert_eq!(face.center_y(), 40.0);
    }

    #[test]
    fn overhanging_box_is_clipped() {
        let face = FaceBox::clipped(&bounds(-10.0, 90.0, 30.0, 40.0), 100, 100).unwrap();
        assert_eq!(face.x, 0.0);
        assert_eq!(face.width, 20.0);
        assert_eq!(face.y, 90.0);
        assert_eq!(face.height, 10.0);
    }

    #[test]
    fn box_outside_image_is_rejected() {
        assert!(FaceBox::clipped(&bounds(200.0, 0.0, 30.0, 40.0), 100, 100).is_none());
        assert!(FaceBox::clipped(&bounds(10.0, 10.0, 0.0, 40.0), 100, 100).is_none());
        assert!(FaceBox::clipped(&bounds(f64::NAN, 10.0, 5.0, 5.0), 100, 100).is_none());
    }
}
