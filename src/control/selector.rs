//! Click-to-acquire target selection.

use crate::control::candidates::{Candidate, CandidateRegistry};
use crate::control::Mode;
use crate::tracker::BoundingBox;

/// A pointer press in frame pixel coordinates (after mirroring).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPoint {
    pub x: f32,
    pub y: f32,
}

impl ClickPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The candidate chosen by a click; the pipeline turns it into a tracking
/// session.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    /// Position of the candidate in the registry
    pub index: usize,
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
}

/// First candidate, in registry order, whose box contains the point.
///
/// Overlapping boxes are common, so the tie-break is part of the contract:
/// the earliest recorded candidate wins, not the smallest or the topmost.
/// Containment is boundary-inclusive.
pub fn first_containing(
    candidates: &[Candidate],
    point: ClickPoint,
) -> Option<(usize, &Candidate)> {
    candidates
        .iter()
        .enumerate()
        .find(|(_, c)| c.bbox.contains(point.x, point.y))
}

/// Maps clicks to acquisitions. Clicks outside Detection mode, and clicks that
/// hit no candidate, are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetSelector;

impl TargetSelector {
    pub fn on_click(
        &self,
        mode: Mode,
        point: ClickPoint,
        registry: &CandidateRegistry,
    ) -> Option<Acquisition> {
        if mode != Mode::Detection {
            return None;
        }
        first_containing(registry.as_slice(), point).map(|(index, c)| Acquisition {
            index,
            bbox: c.bbox,
            label: c.label.clone(),
            confidence: c.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(boxes: &[(BoundingBox, &str)]) -> CandidateRegistry {
        let mut registry = CandidateRegistry::new();
        for (bbox, label) in boxes {
            registry.record(*bbox, *label, 0.9);
        }
        registry
    }

    #[test]
    fn test_hit_inside_and_on_edges() {
        let bbox = BoundingBox::new(100.0, 100.0, 50.0, 80.0);
        let reg = registry(&[(bbox, "person")]);
        let selector = TargetSelector;

        for (x, y) in [(120.0, 150.0), (100.0, 100.0), (150.0, 180.0), (150.0, 100.0)] {
            let hit = selector.on_click(Mode::Detection, ClickPoint::new(x, y), &reg);
            assert_eq!(hit.map(|a| a.bbox), Some(bbox), "click at ({x}, {y})");
        }
    }

    #[test]
    fn test_miss_returns_none() {
        let reg = registry(&[(BoundingBox::new(100.0, 100.0, 50.0, 80.0), "person")]);
        let selector = TargetSelector;
        assert!(selector.on_click(Mode::Detection, ClickPoint::new(99.0, 150.0), &reg).is_none());
        assert!(selector.on_click(Mode::Detection, ClickPoint::new(120.0, 181.0), &reg).is_none());
    }

    #[test]
    fn test_overlap_earliest_wins() {
        let big = BoundingBox::new(0.0, 0.0, 400.0, 400.0);
        let small = BoundingBox::new(100.0, 100.0, 10.0, 10.0);
        let reg = registry(&[(big, "car"), (small, "bottle")]);

        let hit = TargetSelector
            .on_click(Mode::Detection, ClickPoint::new(105.0, 105.0), &reg)
            .unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.label, "car");
    }

    #[test]
    fn test_ignored_while_tracking() {
        let reg = registry(&[(BoundingBox::new(0.0, 0.0, 100.0, 100.0), "dog")]);
        assert!(
            TargetSelector
                .on_click(Mode::Tracking, ClickPoint::new(50.0, 50.0), &reg)
                .is_none()
        );
    }
}
