//! Builder for creating Detection objects from various box formats.

use crate::integration::Detection;
use crate::tracker::BoundingBox;

/// Builder for labelled `Detection`s.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: BoundingBox,
    label: String,
    score: f32,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = BoundingBox::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = BoundingBox::new(cx - w / 2.0, cy - h / 2.0, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = BoundingBox::new(x, y, w, h);
        self
    }

    /// Scale a box given in normalized [0, 1] coordinates to pixels.
    pub fn denormalize(mut self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        self.bbox = BoundingBox::new(
            self.bbox.x * w,
            self.bbox.y * h,
            self.bbox.width * w,
            self.bbox.height * h,
        );
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn build(self) -> Detection {
        Detection::new(self.bbox, self.label, self.score)
    }
}
