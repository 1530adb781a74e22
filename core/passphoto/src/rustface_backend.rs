use std::path::Path;

use crate::error::PassportError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The SeetaFace frontal model (`seeta_fd_frontal_v1.0.bin`) is not shipped
/// with this crate; load it from disk or from bytes fetched by the caller.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load a SeetaFace model from raw bytes.
    pub fn from_bytes(model_data: &[u8]) -> Result<Self, PassportError> {
        let model = rustface::read_model(std::io::Cursor::new(model_data))
            .map_err(|e| PassportError::Detector(format!("invalid SeetaFace model: {e}")))?;
        Ok(Self { model })
    }

    /// Load a SeetaFace model from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PassportError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| PassportError::Detector(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&data)
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceBounds>, PassportError> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                    confidence: face.score(),
                }
            })
            .collect())
    }
}
