use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::{ImageBuffer, Luma, RgbImage};
use log::debug;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;

use crate::error::PassportError;
use crate::segment::{Confidence, MaskKind, SegmentationModel};

/// Square input side of SegFormer-B0 fine-tuned on ADE20K.
pub const DEFAULT_INPUT_SIZE: u32 = 512;

/// ADE20K class index of "person".
pub const ADE20K_PERSON: usize = 12;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

fn onnx_error(e: impl std::fmt::Display) -> PassportError {
    PassportError::Segmentation(e.to_string())
}

/// Semantic segmentation model run through ONNX Runtime.
///
/// Expects a SegFormer-style graph: one `[1, 3, S, S]` ImageNet-normalised
/// input and one `[1, classes, h, w]` logits output. The foreground
/// confidence is the softmax probability of one class, upsampled back to the
/// working resolution.
pub struct OnnxSegmenter {
    session: Mutex<Session>,
    input_size: u32,
    foreground_class: usize,
}

impl OnnxSegmenter {
    /// Load a model from raw `.onnx` bytes.
    pub fn from_memory(model: &[u8]) -> Result<Self, PassportError> {
        let session = Session::builder()
            .map_err(onnx_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_error)?
            .commit_from_memory(model)
            .map_err(onnx_error)?;
        Ok(Self {
            session: Mutex::new(session),
            input_size: DEFAULT_INPUT_SIZE,
            foreground_class: ADE20K_PERSON,
        })
    }

    /// Load a model from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PassportError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| PassportError::Segmentation(format!("{}: {e}", path.display())))?;
        Self::from_memory(&data)
    }

    /// Square side the model expects (default: 512).
    pub fn input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(1);
        self
    }

    /// Class whose probability is the foreground confidence
    /// (default: [`ADE20K_PERSON`]).
    pub fn foreground_class(mut self, class: usize) -> Self {
        self.foreground_class = class;
        self
    }

    fn to_tensor(&self, image: &RgbImage) -> Result<Array4<f32>, PassportError> {
        let size = self.input_size;
        let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
        let plane = (size * size) as usize;
        let mut input = vec![0.0f32; 3 * plane];
        for (i, pixel) in resized.pixels().enumerate() {
            for c in 0..3 {
                let v = pixel.0[c] as f32 / 255.0;
                input[c * plane + i] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }
        Array4::from_shape_vec((1, 3, size as usize, size as usize), input).map_err(onnx_error)
    }
}

/// Softmax probability of `class` at every spatial position of NCHW logits.
fn class_probability(logits: &[f32], classes: usize, plane: usize, class: usize) -> Vec<f32> {
    (0..plane)
        .map(|i| {
            let at = |c: usize| logits[c * plane + i];
            let max = (0..classes).map(at).fold(f32::NEG_INFINITY, f32::max);
            let sum: f32 = (0..classes).map(|c| (at(c) - max).exp()).sum();
            (at(class) - max).exp() / sum
        })
        .collect()
}

impl SegmentationModel for OnnxSegmenter {
    fn infer(&self, image: &RgbImage) -> Result<Confidence, PassportError> {
        let input = Value::from_array(self.to_tensor(image)?).map_err(onnx_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PassportError::Segmentation("model session poisoned".into()))?;
        let outputs = session.run(ort::inputs![input]).map_err(onnx_error)?;
        let (shape, logits) = outputs[0].try_extract_tensor::<f32>().map_err(onnx_error)?;

        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        let [1, classes, out_h, out_w] = dims[..] else {
            return Err(PassportError::Segmentation(format!(
                "expected [1, classes, h, w] logits, got {dims:?}"
            )));
        };
        if self.foreground_class >= classes || logits.len() != classes * out_h * out_w {
            return Err(PassportError::Segmentation(format!(
                "class {} not in {classes}-class output",
                self.foreground_class
            )));
        }
        debug!("segmentation logits {classes}x{out_h}x{out_w}");

        let probs = class_probability(logits, classes, out_h * out_w, self.foreground_class);
        let low_res: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_raw(out_w as u32, out_h as u32, probs).ok_or_else(|| {
                PassportError::Segmentation("logits do not fill the output plane".into())
            })?;
        let mask = image::imageops::resize(
            &low_res,
            image.width(),
            image.height(),
            FilterType::Triangle,
        );

        Ok(Confidence {
            data: mask.into_raw(),
            kind: MaskKind::Foreground,
        })
    }
}
