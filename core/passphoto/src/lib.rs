//! Passport photo preparation: background replacement, face-aware cropping
//! and multi-copy print sheets.
//!
//! # Example
//!
//! ```no_run
//! use passphoto::{catalog, Color, PassportPhoto, SheetSpec};
//!
//! let raw_bytes = std::fs::read("portrait.jpg").unwrap();
//! let photo = PassportPhoto::new(&raw_bytes)
//!     .unwrap()
//!     .auto_crop(true)
//!     .process()
//!     .unwrap();
//!
//! let us = catalog::photo_size("us-passport").unwrap();
//! let a4 = catalog::paper_layout("a4").unwrap();
//! let sheet = SheetSpec::new(us.size, a4.size)
//!     .copies(8)
//!     .print()
//!     .export(&photo)
//!     .unwrap();
//! println!("{}x{} sheet, {} bytes", sheet.width, sheet.height, sheet.data.len());
//! ```
#![warn(missing_docs)]

mod canvas;
/// Built-in photo sizes, paper layouts and background colours.
pub mod catalog;
mod color;
mod composite;
mod crop;
mod encode;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
mod face_locator;
mod history;
mod layout;
#[cfg(feature = "onnx")]
/// ONNX Runtime segmentation backend.
pub mod onnx_backend;
#[cfg(feature = "rustface")]
/// SeetaFace-based face detector backend.
pub mod rustface_backend;
mod segment;
mod session;
mod units;

use image::RgbaImage;
use log::debug;

pub use canvas::{MAX_CANVAS_DIMENSION, MAX_CANVAS_PIXELS};
pub use color::{parse_hex_color, Color, InvalidHexColor};
pub use composite::{composite, composite_cutout};
pub use crop::{
    crop_to_passport, output_dimensions, passport_crop_window, CropRegion, CropWindow,
    DEFAULT_ASPECT_RATIO, OUTPUT_WIDTH,
};
pub use encode::{
    decode_image, encode, export_filename, to_data_url, OutputFormat, DEFAULT_JPEG_QUALITY,
};
/// Error type returned by passphoto operations.
pub use error::PassportError;
pub use face_detector::{FaceBounds, FaceBox, FaceDetector};
pub use face_locator::{heuristic_face_box, FaceLocator};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use layout::{
    center_crop_region, render_sheet, Cell, RenderedSheet, SheetLayout, SheetSpec, BORDER_COLOR,
    GAP_CM,
};
#[cfg(feature = "onnx")]
pub use onnx_backend::OnnxSegmenter;
#[cfg(feature = "rustface")]
pub use rustface_backend::RustfaceDetector;
pub use segment::{
    segment, working_dimensions, AlphaMask, Confidence, Cutout, MaskKind,
    PrecomputedSegmentation, SegmentationModel, MAX_WORKING_DIMENSION,
};
pub use session::EditSession;
pub use units::{
    cm_to_pixels, inch_to_pixels, to_pixels, PhysicalSize, Unit, PREVIEW_DPI, PRINT_DPI,
};

/// One-shot pipeline for a single portrait.
///
/// Decodes the input on construction; [`process`](Self::process) then
/// replaces the background (if a colour is set) and crops around the face
/// (if enabled), in that order. For interactive editing with undo and cheap
/// colour changes use [`EditSession`] instead.
pub struct PassportPhoto {
    image: RgbaImage,
    aspect_ratio: f64,
    auto_crop: bool,
    background: Option<Color>,
    locator: FaceLocator,
    segmenter: Option<Box<dyn SegmentationModel>>,
}

impl PassportPhoto {
    /// Decode raw image bytes (JPEG, PNG, or WebP).
    pub fn new(input: &[u8]) -> Result<Self, PassportError> {
        Ok(Self::from_image(decode_image(input)?))
    }

    /// Start from an already decoded image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            auto_crop: false,
            background: None,
            locator: FaceLocator::default(),
            segmenter: None,
        }
    }

    /// Crop aspect ratio, width / height (default: 3.5 / 4.5).
    pub fn aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Crop around the face to the configured aspect ratio (default: false).
    pub fn auto_crop(mut self, enable: bool) -> Self {
        self.auto_crop = enable;
        self
    }

    /// Replace the background with `color`. Requires a
    /// [`segmenter`](Self::segmenter).
    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Use a platform face detector, falling back to the heuristic box if it
    /// errors.
    ///
    /// ```no_run
    /// use passphoto::{FaceBounds, FaceDetector, PassportError, PassportPhoto};
    ///
    /// struct MyDetector;
    /// impl FaceDetector for MyDetector {
    ///     fn detect(
    ///         &self,
    ///         gray: &[u8],
    ///         width: u32,
    ///         height: u32,
    ///     ) -> Result<Vec<FaceBounds>, PassportError> {
    ///         // Your detection logic here
    ///         Ok(vec![])
    ///     }
    /// }
    ///
    /// let bytes = std::fs::read("portrait.jpg").unwrap();
    /// let photo = PassportPhoto::new(&bytes).unwrap()
    ///     .face_detector(Box::new(MyDetector))
    ///     .auto_crop(true)
    ///     .process();
    /// ```
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.locator = FaceLocator::platform(detector);
        self
    }

    /// Replace the face locator entirely.
    pub fn face_locator(mut self, locator: FaceLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Segmentation model used for background replacement.
    pub fn segmenter(mut self, model: Box<dyn SegmentationModel>) -> Self {
        self.segmenter = Some(model);
        self
    }

    /// Run the configured steps and return the resulting image.
    pub fn process(self) -> Result<RgbaImage, PassportError> {
        if self.auto_crop {
            output_dimensions(self.aspect_ratio)?;
        }

        let mut image = self.image;
        if let Some(color) = self.background {
            let model = self.segmenter.as_deref().ok_or_else(|| {
                PassportError::Segmentation("no segmentation model configured".into())
            })?;
            let cutout = segment(&image, model)?;
            debug!("compositing onto {color}");
            image = composite_cutout(&cutout, color)?;
        }
        if self.auto_crop {
            image = crop_to_passport(&image, &self.locator, self.aspect_ratio)?;
        }
        Ok(image)
    }

    /// Process, then render and encode a sheet of copies.
    pub fn export_sheet(self, spec: &SheetSpec) -> Result<RenderedSheet, PassportError> {
        spec.export(&self.process()?)
    }

    /// Hand the decoded image and configured capabilities to an
    /// [`EditSession`]. The background and crop settings are not applied.
    pub fn into_session(self) -> EditSession {
        let session = EditSession::new(self.image).face_locator(self.locator);
        match self.segmenter {
            Some(model) => session.segmenter(model),
            None => session,
        }
    }
}
