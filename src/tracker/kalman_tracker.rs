//! Single-target tracker built from a detector, a Kalman filter and IoU
//! association.
//!
//! Every update predicts the target box, runs the detector on the frame and
//! matches the prediction against the detections with score-fused IoU
//! distance. A match corrects the filter; a miss coasts on the prediction for
//! at most `max_coast_frames` frames before the tracker reports loss.

use log::debug;

use crate::config::KalmanTrackerConfig;
use crate::frame::Frame;
use crate::integration::Detector;
use crate::tracker::kalman_filter::{KalmanFilter, KalmanState};
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::rect::BoundingBox;
use crate::tracker::single_object::SingleObjectTracker;
use crate::tracker::track_state::TrackState;

pub struct KalmanTracker<D: Detector> {
    detector: D,
    filter: KalmanFilter,
    config: KalmanTrackerConfig,
    estimate: Option<KalmanState>,
    state: TrackState,
    frames_since_match: u32,
}

impl<D: Detector> KalmanTracker<D> {
    pub fn new(detector: D, config: KalmanTrackerConfig) -> Self {
        Self {
            detector,
            filter: KalmanFilter::new(config.std_weight_position, config.std_weight_velocity),
            config,
            estimate: None,
            state: TrackState::New,
            frames_since_match: 0,
        }
    }

    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, KalmanTrackerConfig::default())
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Current box estimate, if initialized.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.estimate.as_ref().map(state_box)
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Best detection for the predicted box, if any passes the gate.
    fn associate(&mut self, frame: &Frame, predicted: BoundingBox) -> Option<BoundingBox> {
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(_) => {
                debug!("frame {}: detector failed during tracking update", frame.seq);
                return None;
            }
        };

        let (boxes, scores): (Vec<BoundingBox>, Vec<f32>) = detections
            .iter()
            .filter(|d| d.score >= self.config.min_score)
            .map(|d| (d.bbox, d.score))
            .unzip();

        let mut cost = matching::iou_distance(&[predicted], &boxes);
        matching::fuse_score(&mut cost, &scores);

        let AssignmentResult { matches, .. } =
            matching::linear_assignment(&cost, self.config.match_thresh);
        matches.first().map(|&(_, idet)| boxes[idet])
    }
}

impl<D: Detector> SingleObjectTracker for KalmanTracker<D> {
    type Error = std::convert::Infallible;

    fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> Result<(), Self::Error> {
        self.estimate = Some(self.filter.initiate(to_f64(bbox.to_xyah())));
        self.state = TrackState::Tracked;
        self.frames_since_match = 0;
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        if self.state == TrackState::Lost {
            return None;
        }
        let estimate = self.estimate.as_ref()?;
        let predicted = self.filter.predict(estimate);
        let predicted_box = state_box(&predicted);

        let corrected = self
            .associate(frame, predicted_box)
            .and_then(|measured| self.filter.update(&predicted, to_f64(measured.to_xyah())).ok());

        match corrected {
            Some(state) => {
                self.estimate = Some(state);
                self.state = TrackState::Tracked;
                self.frames_since_match = 0;
            }
            None => {
                self.frames_since_match += 1;
                if self.frames_since_match > self.config.max_coast_frames {
                    debug!(
                        "frame {}: target unmatched for {} frames, lost",
                        frame.seq, self.frames_since_match
                    );
                    self.state = TrackState::Lost;
                    self.estimate = None;
                    return None;
                }
                self.estimate = Some(predicted);
                self.state = TrackState::Coasting;
            }
        }

        self.bbox()
    }
}

fn to_f64(xyah: [f32; 4]) -> [f64; 4] {
    xyah.map(f64::from)
}

fn state_box(state: &KalmanState) -> BoundingBox {
    let [cx, cy, a, h] = state.measurement();
    BoundingBox::from_xyah(cx as f32, cy as f32, a as f32, h as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::Detection;

    struct QueueDetector {
        frames: Vec<Vec<Detection>>,
    }

    impl Detector for QueueDetector {
        type Error = std::convert::Infallible;

        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
            if self.frames.is_empty() {
                Ok(vec![])
            } else {
                Ok(self.frames.remove(0))
            }
        }
    }

    fn person(x: f32, y: f32) -> Detection {
        Detection::new(BoundingBox::new(x, y, 50.0, 80.0), "person", 0.9)
    }

    #[test]
    fn test_follows_moving_detection() {
        let detector = QueueDetector {
            frames: vec![vec![person(104.0, 100.0)], vec![person(108.0, 100.0)]],
        };
        let mut tracker = KalmanTracker::with_default_config(detector);
        let frame = Frame::blank(0, 640, 480);
        tracker.init(&frame, BoundingBox::new(100.0, 100.0, 50.0, 80.0)).unwrap();

        let first = tracker.update(&frame).unwrap();
        assert!(first.x > 100.0 && first.x <= 104.0);
        let second = tracker.update(&frame).unwrap();
        assert!(second.x > first.x);
        assert_eq!(tracker.state(), TrackState::Tracked);
    }

    #[test]
    fn test_ignores_far_detection_and_coasts() {
        let detector = QueueDetector {
            frames: vec![vec![person(500.0, 300.0)]],
        };
        let config = KalmanTrackerConfig {
            max_coast_frames: 1,
            ..Default::default()
        };
        let mut tracker = KalmanTracker::new(detector, config);
        let frame = Frame::blank(0, 640, 480);
        tracker.init(&frame, BoundingBox::new(100.0, 100.0, 50.0, 80.0)).unwrap();

        let coasted = tracker.update(&frame).unwrap();
        assert!((coasted.x - 100.0).abs() < 1e-3);
        assert_eq!(tracker.state(), TrackState::Coasting);

        assert!(tracker.update(&frame).is_none());
        assert_eq!(tracker.state(), TrackState::Lost);
        assert!(tracker.update(&frame).is_none());
    }

    #[test]
    fn test_uninitialized_reports_none() {
        let mut tracker = KalmanTracker::with_default_config(QueueDetector { frames: vec![] });
        assert!(tracker.update(&Frame::blank(0, 64, 48)).is_none());
        assert_eq!(tracker.state(), TrackState::New);
    }
}
