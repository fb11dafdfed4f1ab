//! Decision logic of the servo loop: which candidate becomes the target, and
//! how the target's geometry becomes an actuator command.

mod actuation;
mod candidates;
mod controller;
mod selector;

pub use actuation::{ActuationCommand, Actuator, ActuatorLink, WriterLink, open_serial};
#[cfg(feature = "serial")]
pub use actuation::SerialLink;
pub use candidates::{Candidate, CandidateRegistry};
pub use controller::{
    AxisCommand, ControlOutput, DepthDirection, HorizontalDirection, ProportionalController,
    SERVO_CENTER, SERVO_MAX,
};
pub use selector::{Acquisition, ClickPoint, TargetSelector, first_containing};

/// Operating mode of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Running the detector and waiting for the operator to pick a target
    #[default]
    Detection,
    /// Following the acquired target
    Tracking,
}
