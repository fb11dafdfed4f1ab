//! ServoPipeline: the Detection/Tracking mode state machine.

use std::fmt::Display;

use log::{debug, info, warn};

use crate::config::{DetectionFilter, ServoConfig};
use crate::control::{
    Acquisition, ActuationCommand, Actuator, Candidate, CandidateRegistry, ClickPoint,
    ControlOutput, Mode, ProportionalController, TargetSelector,
};
use crate::frame::Frame;
use crate::integration::Detector;
use crate::tracker::{BoundingBox, TrackerFactory, TrackingSession};

/// What happened on one frame, for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameReport {
    /// Candidates recorded this frame, awaiting a click.
    Detection { candidates: Vec<Candidate> },
    /// The target was tracked and a command computed.
    Tracking {
        bbox: BoundingBox,
        output: ControlOutput,
        command: ActuationCommand,
        /// Whether the command reached the actuator link
        delivered: bool,
    },
    /// The tracker lost the target; the pipeline is back in Detection.
    TargetLost { last_box: BoundingBox },
}

impl FrameReport {
    /// Mode the pipeline is in after this frame.
    pub fn mode(&self) -> Mode {
        match self {
            FrameReport::Tracking { .. } => Mode::Tracking,
            FrameReport::Detection { .. } | FrameReport::TargetLost { .. } => Mode::Detection,
        }
    }
}

enum ModeState<T> {
    Detection(CandidateRegistry),
    Tracking(TrackingSession<T>),
}

/// Counters kept across mode changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub acquisitions: u64,
    pub losses: u64,
}

/// Drives detection, click acquisition, tracking and control.
///
/// Candidates only exist in Detection mode and a tracking session only in
/// Tracking mode; the two are variants of one state, so a frame always ends in
/// exactly one mode.
pub struct ServoPipeline<D: Detector, F: TrackerFactory> {
    detector: D,
    trackers: F,
    filter: DetectionFilter,
    controller: ProportionalController,
    selector: TargetSelector,
    actuator: Actuator,
    state: ModeState<F::Tracker>,
    stats: PipelineStats,
}

impl<D, F> ServoPipeline<D, F>
where
    D: Detector,
    D::Error: Display,
    F: TrackerFactory,
{
    /// Create a pipeline in Detection mode.
    ///
    /// `trackers` builds one fresh tracker per acquisition. Detection filtering
    /// and controller gains are taken from `config`.
    pub fn new(detector: D, trackers: F, config: &ServoConfig, actuator: Actuator) -> Self {
        Self {
            detector,
            trackers,
            filter: config.detection.filter(),
            controller: ProportionalController::new(config.controller),
            selector: TargetSelector,
            actuator,
            state: ModeState::Detection(CandidateRegistry::new()),
            stats: PipelineStats::default(),
        }
    }

    /// Pipeline with stock tuning and no actuator.
    pub fn with_default_config(detector: D, trackers: F) -> Self {
        Self::new(detector, trackers, &ServoConfig::default(), Actuator::disconnected())
    }

    /// Mode the pipeline is in.
    pub fn mode(&self) -> Mode {
        match self.state {
            ModeState::Detection(_) => Mode::Detection,
            ModeState::Tracking(_) => Mode::Tracking,
        }
    }

    /// Current candidates; empty while tracking.
    pub fn candidates(&self) -> &[Candidate] {
        match &self.state {
            ModeState::Detection(registry) => registry.as_slice(),
            ModeState::Tracking(_) => &[],
        }
    }

    /// The active tracking session, if any.
    pub fn session(&self) -> Option<&TrackingSession<F::Tracker>> {
        match &self.state {
            ModeState::Tracking(session) => Some(session),
            ModeState::Detection(_) => None,
        }
    }

    /// Run one frame of mode-dependent logic.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameReport {
        match &mut self.state {
            ModeState::Detection(registry) => {
                registry.reset();
                match self.detector.detect(frame) {
                    Ok(detections) => {
                        for d in detections.into_iter().filter(|d| self.filter.accepts(d)) {
                            registry.record(d.bbox, d.label, d.score);
                        }
                    }
                    Err(e) => debug!("frame {}: detection failed: {e}", frame.seq),
                }
                FrameReport::Detection {
                    candidates: registry.as_slice().to_vec(),
                }
            }
            ModeState::Tracking(session) => {
                let Some(bbox) = session.update(frame) else {
                    let last_box = session.current_box();
                    info!(
                        "frame {}: lost {} after {} frames, back to detection",
                        frame.seq,
                        session.label(),
                        session.frames_tracked()
                    );
                    self.state = ModeState::Detection(CandidateRegistry::new());
                    self.stats.losses += 1;
                    return FrameReport::TargetLost { last_box };
                };

                let output = self.controller.compute(
                    bbox,
                    frame.width(),
                    frame.height(),
                    session.reference_area(),
                );
                let command = ActuationCommand::from_output(&output);
                let delivered = self.actuator.send(command);
                debug!("frame {}: {} -> {}", frame.seq, output, command);

                FrameReport::Tracking {
                    bbox,
                    output,
                    command,
                    delivered,
                }
            }
        }
    }

    /// Apply a click against the candidates of `frame`, the frame most
    /// recently passed to [`process_frame`](Self::process_frame).
    ///
    /// On a hit, a fresh tracker is created and seeded on `frame`, replacing
    /// any previous session. Misses and clicks while tracking change nothing.
    pub fn handle_click(&mut self, frame: &Frame, point: ClickPoint) -> Option<Acquisition> {
        let mode = self.mode();
        let ModeState::Detection(registry) = &self.state else {
            debug!("click at ({}, {}) ignored while tracking", point.x, point.y);
            return None;
        };
        let acquisition = self.selector.on_click(mode, point, registry)?;

        let tracker = self.trackers.create();
        match TrackingSession::initialize(tracker, frame, acquisition.bbox, &acquisition.label) {
            Ok(session) => {
                info!(
                    "target acquired: {} [{}] at {}, reference area {:.0}",
                    acquisition.label,
                    acquisition.index,
                    acquisition.bbox,
                    session.reference_area()
                );
                self.state = ModeState::Tracking(session);
                self.stats.acquisitions += 1;
                Some(acquisition)
            }
            Err(e) => {
                warn!("tracker initialization failed for {}: {e}", acquisition.label);
                None
            }
        }
    }

    /// Send the neutral command and release the actuator link.
    pub fn shutdown(&mut self) {
        self.actuator.shutdown();
    }

    /// Acquisition and loss counts since creation.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Get a reference to the actuator.
    pub fn actuator(&self) -> &Actuator {
        &self.actuator
    }

    /// Get a reference to the detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }
}
