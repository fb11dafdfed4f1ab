//! Scripted replay of a session, for running the full loop without a camera.
//!
//! A scenario is JSON lines, one frame per line:
//!
//! ```text
//! {"width": 640, "height": 480,
//!  "detections": [{"bbox": [100, 100, 50, 80], "label": "person", "score": 0.9}],
//!  "events": [{"click": {"x": 120, "y": 150}}]}
//! {"track": [300, 100, 50, 80], "events": ["exit"]}
//! ```
//!
//! Boxes are `[x, y, width, height]`. `track` is what the scripted tracker
//! reports on that frame (absent means the tracker fails). `events` are
//! delivered to the input queue while that frame is on screen. Blank lines and
//! lines starting with `#` are skipped.

use std::path::Path;
use std::rc::Rc;

use crossbeam_channel::Sender;
use serde::Deserialize;

use crate::control::ClickPoint;
use crate::error::{Result, ServoError};
use crate::frame::{Frame, FrameSource};
use crate::integration::{Detection, Detector, InputEvent};
use crate::tracker::{BoundingBox, SingleObjectTracker};

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFrame {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub detections: Vec<ScriptedDetection>,
    #[serde(default)]
    pub track: Option<[f32; 4]>,
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedDetection {
    pub bbox: [f32; 4],
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedEvent {
    Click { x: f32, y: f32 },
    Exit,
}

impl From<ScriptedEvent> for InputEvent {
    fn from(event: ScriptedEvent) -> Self {
        match event {
            ScriptedEvent::Click { x, y } => InputEvent::Click(ClickPoint::new(x, y)),
            ScriptedEvent::Exit => InputEvent::Exit,
        }
    }
}

fn to_box([x, y, w, h]: [f32; 4]) -> BoundingBox {
    BoundingBox::new(x, y, w, h)
}

#[derive(Debug, Clone, Default)]
pub struct Scenario {
    frames: Vec<ScenarioFrame>,
}

impl Scenario {
    pub fn parse(text: &str) -> Result<Self> {
        let mut frames = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let frame = serde_json::from_str(line).map_err(|source| ServoError::Scenario {
                line: idx + 1,
                source,
            })?;
            frames.push(frame);
        }
        Ok(Self { frames })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, seq: u64) -> Option<&ScenarioFrame> {
        self.frames.get(seq as usize)
    }
}

/// Emits one blank frame per scenario line and queues that line's events.
pub struct ScenarioSource {
    scenario: Rc<Scenario>,
    next: u64,
    events: Sender<InputEvent>,
}

impl ScenarioSource {
    pub fn new(scenario: Rc<Scenario>, events: Sender<InputEvent>) -> Self {
        Self {
            scenario,
            next: 0,
            events,
        }
    }
}

impl FrameSource for ScenarioSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(scripted) = self.scenario.frame(self.next) else {
            return Ok(None);
        };
        let frame = Frame::blank(self.next, scripted.width, scripted.height);
        for event in &scripted.events {
            self.events
                .send((*event).into())
                .map_err(|_| ServoError::FrameSource("input queue closed".into()))?;
        }
        self.next += 1;
        Ok(Some(frame))
    }
}

/// Answers with the detections scripted for the frame's sequence number.
#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    scenario: Rc<Scenario>,
}

impl ScriptedDetector {
    pub fn new(scenario: Rc<Scenario>) -> Self {
        Self { scenario }
    }
}

impl Detector for ScriptedDetector {
    type Error = std::convert::Infallible;

    fn detect(&mut self, frame: &Frame) -> std::result::Result<Vec<Detection>, Self::Error> {
        Ok(self
            .scenario
            .frame(frame.seq)
            .map(|f| {
                f.detections
                    .iter()
                    .map(|d| Detection::new(to_box(d.bbox), d.label.clone(), d.score))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Reports the `track` box scripted for each frame.
#[derive(Debug, Clone)]
pub struct ScriptedTracker {
    scenario: Rc<Scenario>,
    initialized: bool,
}

impl ScriptedTracker {
    pub fn new(scenario: Rc<Scenario>) -> Self {
        Self {
            scenario,
            initialized: false,
        }
    }
}

impl SingleObjectTracker for ScriptedTracker {
    type Error = std::convert::Infallible;

    fn init(&mut self, _frame: &Frame, _bbox: BoundingBox) -> std::result::Result<(), Self::Error> {
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        if !self.initialized {
            return None;
        }
        self.scenario.frame(frame.seq)?.track.map(to_box)
    }
}
