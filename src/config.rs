//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock tuning: 0.5 detection confidence, the six-class allow-list, the
//! proportional gains and dead-zones of the controller, and a mirrored capture.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::integration::Detection;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub detection: DetectionConfig,
    pub controller: ControllerConfig,
    pub tracker: KalmanTrackerConfig,
    pub actuator: ActuatorConfig,
    pub capture: CaptureConfig,
}

impl ServoConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Which detections become selectable candidates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Strict lower bound on detector confidence.
    pub min_confidence: f32,
    /// Class allow-list.
    pub classes: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            classes: ["person", "car", "bottle", "cat", "dog", "cell phone"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DetectionConfig {
    pub fn filter(&self) -> DetectionFilter {
        DetectionFilter {
            min_confidence: self.min_confidence,
            classes: self.classes.iter().cloned().collect(),
        }
    }
}

/// Compiled form of [`DetectionConfig`].
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    min_confidence: f32,
    classes: HashSet<String>,
}

impl DetectionFilter {
    pub fn accepts(&self, detection: &Detection) -> bool {
        detection.score > self.min_confidence && self.classes.contains(&detection.label)
    }
}

impl Default for DetectionFilter {
    fn default() -> Self {
        DetectionConfig::default().filter()
    }
}

/// Gains and thresholds of the proportional controller.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Horizontal gain, velocity per pixel of error.
    pub kp_position: f32,
    /// Half-width of the centered band, in pixels.
    pub dead_zone: f32,
    /// Servo degrees per unit of horizontal velocity.
    pub conversion_factor: f32,
    /// Depth gain, velocity per square pixel of area error.
    pub kp_area: f32,
    /// Relative area band around the reference treated as "hold".
    pub area_threshold: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kp_position: 0.1,
            dead_zone: 30.0,
            conversion_factor: 4.5,
            kp_area: 0.001,
            area_threshold: 0.15,
        }
    }
}

/// Tuning for the built-in Kalman association tracker.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct KalmanTrackerConfig {
    /// Maximum fused IoU distance accepted as a match.
    pub match_thresh: f32,
    /// Detections below this score are not considered for association.
    pub min_score: f32,
    /// Consecutive unmatched frames tolerated before reporting loss.
    pub max_coast_frames: u32,
    pub std_weight_position: f64,
    pub std_weight_velocity: f64,
}

impl Default for KalmanTrackerConfig {
    fn default() -> Self {
        Self {
            match_thresh: 0.8,
            min_score: 0.1,
            max_coast_frames: 5,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Serial device path. `None` runs without an actuator.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            write_timeout_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Flip frames horizontally before detection and selection.
    pub mirror: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { mirror: true }
    }
}
