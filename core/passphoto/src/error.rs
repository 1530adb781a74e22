use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassportError {
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("segmentation failed: {0}")]
    Segmentation(String),

    #[error("no face detected in the image")]
    FaceNotDetected,

    #[error("face detector failed: {0}")]
    Detector(String),

    #[error("cannot allocate rendering surface: {0}")]
    Canvas(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("aspect ratio must be finite and > 0, got {0}")]
    InvalidAspectRatio(f64),

    #[error("dpi must be > 0, got {0}")]
    InvalidDpi(u32),

    #[error("physical size must have finite, positive width and height")]
    InvalidPhysicalSize,

    #[error("quality must be between 0.0 and 1.0, got {0}")]
    InvalidQuality(f32),

    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    MaskMismatch {
        mask_width: u32,
        mask_height: u32,
        image_width: u32,
        image_height: u32,
    },
}
