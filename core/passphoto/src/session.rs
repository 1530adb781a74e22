//! One photo's editing session: crop and background changes with undo/redo.

use std::sync::Arc;

use image::RgbaImage;
use log::debug;

use crate::color::Color;
use crate::composite::composite_cutout;
use crate::crop::{crop_to_passport, DEFAULT_ASPECT_RATIO};
use crate::encode::decode_image;
use crate::error::PassportError;
use crate::face_locator::FaceLocator;
use crate::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::segment::{segment, Cutout, SegmentationModel};

/// An image in the history, with the cutout it can be recoloured from.
#[derive(Debug, Clone)]
struct Snapshot {
    image: Arc<RgbaImage>,
    cutout: Option<Arc<Cutout>>,
}

/// Editing state for one photo.
///
/// Every produced image is kept as an immutable snapshot. After the first
/// background replacement the segmented cutout travels with each recoloured
/// snapshot, so later colour changes only re-run compositing. Cropping
/// produces a snapshot without a cutout, because the old mask no longer
/// lines up with the cropped pixels.
pub struct EditSession {
    current: Snapshot,
    history: History<Snapshot>,
    locator: FaceLocator,
    segmenter: Option<Box<dyn SegmentationModel>>,
}

impl EditSession {
    /// Start a session on a decoded image.
    pub fn new(image: RgbaImage) -> Self {
        let current = Snapshot {
            image: Arc::new(image),
            cutout: None,
        };
        let mut history = History::new(DEFAULT_HISTORY_CAPACITY);
        history.push(current.clone());
        Self {
            current,
            history,
            locator: FaceLocator::default(),
            segmenter: None,
        }
    }

    /// Start a session from encoded image bytes.
    pub fn from_bytes(input: &[u8]) -> Result<Self, PassportError> {
        Ok(Self::new(decode_image(input)?))
    }

    /// Use `locator` to find faces when cropping (default: heuristic).
    pub fn face_locator(mut self, locator: FaceLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Use `model` when a background replacement needs a fresh cutout.
    pub fn segmenter(mut self, model: Box<dyn SegmentationModel>) -> Self {
        self.segmenter = Some(model);
        self
    }

    /// The current image.
    pub fn current(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.current.image)
    }

    /// Whether the current image can be recoloured without segmenting.
    pub fn has_cutout(&self) -> bool {
        self.current.cutout.is_some()
    }

    /// Put the subject on a solid `color` background.
    ///
    /// Segments the current image only if it has no cutout yet.
    pub fn replace_background(&mut self, color: Color) -> Result<Arc<RgbaImage>, PassportError> {
        let cutout = match &self.current.cutout {
            Some(cutout) => Arc::clone(cutout),
            None => {
                let model = self.segmenter.as_deref().ok_or_else(|| {
                    PassportError::Segmentation("no segmentation model configured".into())
                })?;
                debug!("segmenting current image");
                Arc::new(segment(&self.current.image, model)?)
            }
        };
        let image = composite_cutout(&cutout, color)?;
        self.record(Snapshot {
            image: Arc::new(image),
            cutout: Some(cutout),
        });
        Ok(self.current())
    }

    /// Crop the current image around the face at `aspect_ratio`.
    pub fn crop(&mut self, aspect_ratio: f64) -> Result<Arc<RgbaImage>, PassportError> {
        let image = crop_to_passport(&self.current.image, &self.locator, aspect_ratio)?;
        self.record(Snapshot {
            image: Arc::new(image),
            cutout: None,
        });
        Ok(self.current())
    }

    /// Crop at the default 3.5 × 4.5 passport ratio.
    pub fn crop_passport(&mut self) -> Result<Arc<RgbaImage>, PassportError> {
        self.crop(DEFAULT_ASPECT_RATIO)
    }

    /// Go back one step.
    pub fn undo(&mut self) -> Option<Arc<RgbaImage>> {
        let snapshot = self.history.undo()?.clone();
        self.current = snapshot;
        Some(self.current())
    }

    /// Go forward one step.
    pub fn redo(&mut self) -> Option<Arc<RgbaImage>> {
        let snapshot = self.history.redo()?.clone();
        self.current = snapshot;
        Some(self.current())
    }

    /// Whether [`undo`](Self::undo) would do anything.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`redo`](Self::redo) would do anything.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// `(position, length)` of the history, position counted from 1.
    pub fn position(&self) -> (usize, usize) {
        (self.history.cursor() + 1, self.history.len())
    }

    fn record(&mut self, snapshot: Snapshot) {
        // An unchanged image is not a new step.
        if *snapshot.image == *self.current.image {
            self.current.cutout = snapshot.cutout.or(self.current.cutout.take());
            if let Some(entry) = self.history.current_mut() {
                entry.cutout = self.current.cutout.clone();
            }
            return;
        }
        self.history.push(snapshot.clone());
        self.current = snapshot;
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("dimensions", &self.current.image.dimensions())
            .field("has_cutout", &self.has_cutout())
            .field("position", &self.position())
            .field("locator", &self.locator)
            .field("segmenter", &self.segmenter.is_some())
            .finish()
    }
}
