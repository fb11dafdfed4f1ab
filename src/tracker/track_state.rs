/// Lifecycle of the single target followed by [`KalmanTracker`](super::KalmanTracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Not initialized yet
    #[default]
    New,
    /// Matched to a detection on the last update
    Tracked,
    /// Unmatched, reporting the motion prediction
    Coasting,
    /// Coasted too long; the tracker reports failure until re-initialized
    Lost,
}
