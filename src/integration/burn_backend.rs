//! Burn inference backend for object detection.
//!
//! `BurnDetector` implements [`Detector`] for detection models built with the
//! Burn framework. Class ids coming out of the model are mapped to labels
//! through a vocabulary (see [`load_labels`](super::load_labels)).
//!
//! # Example
//!
//! ```ignore
//! use follow_servo::integration::{BurnDetector, BurnModel, load_labels};
//! use burn::backend::NdArray;
//!
//! struct MySsdModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MySsdModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let labels = load_labels("coco_class_labels.txt")?;
//! let detector = BurnDetector::new(MySsdModel::load("model.bin"), Default::default(), labels);
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;

use super::{Detection, DetectionBuilder, Detector};
use crate::frame::Frame;

#[derive(Debug, Clone, Error)]
pub enum BurnDetectorError {
    #[error("invalid input dimensions: expected {expected:?}, got {got:?}")]
    InvalidInputDimensions {
        expected: (u32, u32, u32),
        got: (u32, u32, u32),
    },
    #[error("preprocessing error: {0}")]
    Preprocessing(String),
}

/// Raw model output for one box.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Box in the layout reported by [`BurnModel::box_format`]
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: usize,
}

/// How a model lays out `RawDetection::bbox`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxFormat {
    /// Center x, center y, width, height in pixels
    Xywh,
    /// Corner pairs in pixels
    Tlbr,
    /// Corner pairs normalized to [0, 1] (SSD-style heads)
    NormalizedTlbr,
}

/// Trait for Burn-based detection models.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run forward pass on a `[1, C, H, W]` tensor scaled to [0, 1].
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 300, 300)
    }

    fn box_format(&self) -> BoxFormat {
        BoxFormat::NormalizedTlbr
    }
}

pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    labels: Vec<String>,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device, labels: Vec<String>) -> Self {
        Self {
            model,
            device,
            labels,
        }
    }

    /// Convert an HWC frame into a `[1, C, H, W]` tensor.
    ///
    /// Frames must already be at the model's input size; resizing belongs to
    /// the capture stage.
    pub fn preprocess(&self, frame: &Frame) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        let got = (frame.channels() as u32, frame.height(), frame.width());

        if got != (channels, target_h, target_w) {
            return Err(BurnDetectorError::InvalidInputDimensions {
                expected: (channels, target_h, target_w),
                got,
            });
        }

        let chw = frame.pixels.view().permuted_axes([2, 0, 1]);
        let data: Vec<f32> = chw.iter().map(|&x| x as f32 / 255.0).collect();
        if data.is_empty() {
            return Err(BurnDetectorError::Preprocessing("empty frame".into()));
        }

        Ok(Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
            1,
            channels as usize,
            target_h as usize,
            target_w as usize,
        ]))
    }

    fn postprocess(&self, raw: Vec<RawDetection>, width: u32, height: u32) -> Vec<Detection> {
        let format = self.model.box_format();
        raw.into_iter()
            .map(|d| {
                let label = self
                    .labels
                    .get(d.class_id)
                    .cloned()
                    .unwrap_or_else(|| format!("class {}", d.class_id));
                let [a, b, c, e] = d.bbox;
                let builder = DetectionBuilder::new().label(label).score(d.score);
                match format {
                    BoxFormat::Xywh => builder.xywh(a, b, c, e),
                    BoxFormat::Tlbr => builder.tlbr(a, b, c, e),
                    BoxFormat::NormalizedTlbr => {
                        builder.tlbr(a, b, c, e).denormalize(width, height)
                    }
                }
                .build()
            })
            .collect()
    }
}

impl<B: Backend, M: BurnModel<B>> Detector for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(frame)?;
        let raw = self.model.forward(tensor);
        Ok(self.postprocess(raw, frame.width(), frame.height()))
    }
}
