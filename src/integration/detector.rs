//! Trait for object detection inference backends.

use std::path::Path;

use crate::error::Result;
use crate::frame::Frame;
use crate::tracker::BoundingBox;

/// One labelled detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in TLWH pixel coordinates
    pub bbox: BoundingBox,
    /// Class label from the detector's vocabulary
    pub label: String,
    /// Detection confidence score
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the servo pipeline.
///
/// # Example
///
/// ```ignore
/// use follow_servo::{Detection, Detector, Frame};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl Detector for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections in emission order
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector {
    /// Error type for detection failures.
    type Error;

    /// Run inference on one frame.
    ///
    /// Detections are returned in the detector's emission order; the pipeline
    /// preserves that order for click selection.
    fn detect(&mut self, frame: &Frame) -> std::result::Result<Vec<Detection>, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &mut D {
    type Error = D::Error;

    fn detect(&mut self, frame: &Frame) -> std::result::Result<Vec<Detection>, Self::Error> {
        (**self).detect(frame)
    }
}

/// Read a class vocabulary, one label per line. Line index is the class id.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.lines().map(|l| l.trim().to_string()).collect())
}
