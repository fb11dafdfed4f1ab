//! Tracker collaborator interface.

use crate::frame::Frame;
use crate::tracker::rect::BoundingBox;

/// A single-object visual tracker.
///
/// The tracker is seeded once with [`init`](Self::init); each following frame
/// goes through [`update`](Self::update), which returns the new box, or `None`
/// when the target is lost. A tracker that has reported `None` is not asked
/// again; the pipeline discards it.
pub trait SingleObjectTracker {
    /// Error type for initialization failures.
    type Error: std::fmt::Display;

    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<(), Self::Error>;

    fn update(&mut self, frame: &Frame) -> Option<BoundingBox>;
}

/// Produces a fresh tracker instance for every acquisition.
///
/// Any `FnMut() -> T` closure is a factory.
pub trait TrackerFactory {
    type Tracker: SingleObjectTracker;

    fn create(&mut self) -> Self::Tracker;
}

impl<T, F> TrackerFactory for F
where
    T: SingleObjectTracker,
    F: FnMut() -> T,
{
    type Tracker = T;

    fn create(&mut self) -> T {
        self()
    }
}
