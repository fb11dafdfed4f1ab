//! Integration of the detector and tracker collaborators with the control
//! core.
//!
//! This module provides the detector trait and helpers, the mode state
//! machine that ties detection, selection, tracking and control together, and
//! the frame loop that drives it.

mod builder;
mod detector;
mod driver;
mod events;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{Detection, Detector, load_labels};
pub use driver::{ExitReason, RunSummary, ServoLoop};
pub use events::{EventQueue, InputEvent};
pub use pipeline::{FrameReport, PipelineStats, ServoPipeline};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BoxFormat, BurnDetector, BurnDetectorError, BurnModel, RawDetection};
