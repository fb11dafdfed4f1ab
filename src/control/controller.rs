//! Proportional control law: target geometry in, actuation out.
//!
//! Two independent single-axis P-controllers, each with a dead band so that
//! small errors around the setpoint produce no command:
//!
//! - horizontal: pixel offset of the box center from the frame center, mapped
//!   to a servo angle around 90 degrees;
//! - depth: box area relative to the area at acquisition time, used as a
//!   distance proxy (larger box means the target is closer).

use std::fmt;

use crate::config::ControllerConfig;
use crate::tracker::BoundingBox;

pub const SERVO_CENTER: u8 = 90;
pub const SERVO_MAX: u8 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalDirection {
    Left,
    Right,
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthDirection {
    /// Target too far, move closer
    Approach,
    /// Target too close, move back
    Retreat,
    Hold,
}

impl DepthDirection {
    /// Single-character code on the actuator wire.
    pub fn code(self) -> char {
        match self {
            DepthDirection::Approach => 'A',
            DepthDirection::Retreat => 'F',
            DepthDirection::Hold => 'M',
        }
    }
}

/// Direction plus non-negative speed on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCommand<D> {
    pub direction: D,
    pub magnitude: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// Box center minus frame center, pixels; negative means left of center
    pub horizontal_error: f32,
    /// Current area minus reference area; positive means closer than reference
    pub depth_error: f32,
    pub horizontal: AxisCommand<HorizontalDirection>,
    pub depth: AxisCommand<DepthDirection>,
    /// Always within [0, 180]
    pub servo_angle: u8,
}

impl ControlOutput {
    /// Operator-facing summary of both axes.
    pub fn status_text(&self) -> String {
        format!("Pos: {} | Dist: {}", self.horizontal_text(), self.depth_text())
    }

    fn horizontal_text(&self) -> String {
        match self.horizontal.direction {
            HorizontalDirection::Left => {
                format!("MOVE LEFT (Vel: {:.1})", self.horizontal.magnitude)
            }
            HorizontalDirection::Right => {
                format!("MOVE RIGHT (Vel: {:.1})", self.horizontal.magnitude)
            }
            HorizontalDirection::Centered => "CENTERED".to_string(),
        }
    }

    fn depth_text(&self) -> String {
        match self.depth.direction {
            DepthDirection::Retreat => format!("MOVE BACK (Vel: {:.1})", self.depth.magnitude),
            DepthDirection::Approach => format!("APPROACH (Vel: {:.1})", self.depth.magnitude),
            DepthDirection::Hold => "HOLD DISTANCE".to_string(),
        }
    }
}

impl fmt::Display for ControlOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_text())
    }
}

/// Stateless P-controller. `compute` is a pure function of its arguments and
/// the configured gains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionalController {
    config: ControllerConfig,
}

impl ProportionalController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn compute(
        &self,
        bbox: BoundingBox,
        frame_width: u32,
        _frame_height: u32,
        reference_area: f32,
    ) -> ControlOutput {
        let (horizontal_error, horizontal) = self.horizontal(bbox, frame_width);
        let (depth_error, depth) = self.depth(bbox, reference_area);
        let servo_angle = self.servo_angle(horizontal);

        ControlOutput {
            horizontal_error,
            depth_error,
            horizontal,
            depth,
            servo_angle,
        }
    }

    fn horizontal(
        &self,
        bbox: BoundingBox,
        frame_width: u32,
    ) -> (f32, AxisCommand<HorizontalDirection>) {
        // Centers are whole pixels: integer frame midpoint, truncated box center.
        let center_frame_x = (frame_width / 2) as f32;
        let center_obj_x = (bbox.x + bbox.width / 2.0).trunc();

        let error = center_obj_x - center_frame_x;
        let velocity = self.config.kp_position * error;
        let dead_zone = self.config.dead_zone;

        let command = if error < -dead_zone {
            AxisCommand {
                direction: HorizontalDirection::Left,
                magnitude: velocity.abs(),
            }
        } else if error > dead_zone {
            AxisCommand {
                direction: HorizontalDirection::Right,
                magnitude: velocity,
            }
        } else {
            AxisCommand {
                direction: HorizontalDirection::Centered,
                magnitude: 0.0,
            }
        };
        (error, command)
    }

    fn depth(&self, bbox: BoundingBox, reference_area: f32) -> (f32, AxisCommand<DepthDirection>) {
        let current_area = bbox.area();
        let error = current_area - reference_area;
        let velocity = -(self.config.kp_area * error);
        let threshold = self.config.area_threshold;

        let command = if current_area > reference_area * (1.0 + threshold) {
            AxisCommand {
                direction: DepthDirection::Retreat,
                magnitude: velocity.abs(),
            }
        } else if current_area < reference_area * (1.0 - threshold) {
            AxisCommand {
                direction: DepthDirection::Approach,
                magnitude: velocity,
            }
        } else {
            AxisCommand {
                direction: DepthDirection::Hold,
                magnitude: 0.0,
            }
        };
        (error, command)
    }

    /// Left turns raise the angle above center, right turns lower it.
    ///
    /// The clamped angle is truncated to whole degrees, not rounded: an offset
    /// of 87.75 commands 177.
    fn servo_angle(&self, horizontal: AxisCommand<HorizontalDirection>) -> u8 {
        let offset = horizontal.magnitude * self.config.conversion_factor;
        let center = SERVO_CENTER as f32;
        let angle = match horizontal.direction {
            HorizontalDirection::Left => center + offset,
            HorizontalDirection::Right => center - offset,
            HorizontalDirection::Centered => center,
        };
        angle.clamp(0.0, SERVO_MAX as f32).trunc() as u8
    }
}
