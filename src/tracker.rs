mod kalman_filter;
mod kalman_tracker;
mod matching;
mod rect;
mod session;
mod single_object;
mod track_state;

pub use kalman_filter::{KalmanFilter, KalmanState};
pub use kalman_tracker::KalmanTracker;
pub use matching::{AssignmentResult, fuse_score, iou_distance, linear_assignment};
pub use rect::BoundingBox;
pub use session::TrackingSession;
pub use single_object::{SingleObjectTracker, TrackerFactory};
pub use track_state::TrackState;
