//! Human-in-the-loop visual servoing.
//!
//! Frames run through a detector until the operator clicks one of the
//! detected objects. The clicked box seeds a single-object tracker, and from
//! then on every frame's tracked box is turned into a servo angle and a
//! distance directive by a proportional controller and streamed to the
//! actuator as `"<angle>,<A|F|M>\n"`. When the tracker loses the target the
//! pipeline falls back to detection.
//!
//! The detector, tracker, capture, display and serial link are collaborators
//! behind traits: [`Detector`], [`SingleObjectTracker`], [`FrameSource`],
//! [`render::Renderer`] and [`control::ActuatorLink`].

pub mod config;
pub mod control;
pub mod error;
pub mod frame;
pub mod integration;
pub mod render;
pub mod replay;
pub mod tracker;

pub use config::ServoConfig;
pub use control::{ActuationCommand, Actuator, ClickPoint, ControlOutput, Mode};
pub use error::{Result, ServoError};
pub use frame::{Frame, FrameSource};
pub use integration::{
    Detection, DetectionBuilder, Detector, EventQueue, FrameReport, InputEvent, RunSummary,
    ServoLoop, ServoPipeline,
};
pub use tracker::{BoundingBox, KalmanTracker, SingleObjectTracker, TrackerFactory};
