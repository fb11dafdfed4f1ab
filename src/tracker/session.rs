//! Lifecycle of one tracked target.

use crate::frame::Frame;
use crate::tracker::rect::BoundingBox;
use crate::tracker::single_object::SingleObjectTracker;

/// One acquired target: its tracker instance and the geometry the controller
/// needs.
///
/// `reference_area` is fixed when the session is created. A new acquisition
/// builds a new session, so old and new tracker state never mix.
#[derive(Debug)]
pub struct TrackingSession<T> {
    tracker: T,
    label: String,
    reference_area: f32,
    current_box: BoundingBox,
    frames_tracked: u32,
}

impl<T: SingleObjectTracker> TrackingSession<T> {
    /// Seed `tracker` with the selected box on the frame it was selected in.
    pub fn initialize(
        mut tracker: T,
        frame: &Frame,
        bbox: BoundingBox,
        label: impl Into<String>,
    ) -> Result<Self, T::Error> {
        tracker.init(frame, bbox)?;
        Ok(Self {
            tracker,
            label: label.into(),
            reference_area: bbox.area(),
            current_box: bbox,
            frames_tracked: 0,
        })
    }

    /// Advance the tracker. On `None` the session is finished and must be
    /// dropped by the caller.
    pub fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let bbox = self.tracker.update(frame)?;
        self.current_box = bbox;
        self.frames_tracked += 1;
        Some(bbox)
    }

    pub fn reference_area(&self) -> f32 {
        self.reference_area
    }

    pub fn current_box(&self) -> BoundingBox {
        self.current_box
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frames_tracked(&self) -> u32 {
        self.frames_tracked
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }
}
