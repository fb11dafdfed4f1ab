//! The frame loop: capture, process, render, drain input, repeat.

use std::fmt::Display;

use log::{error, info};

use crate::control::Mode;
use crate::frame::FrameSource;
use crate::integration::events::{EventQueue, InputEvent};
use crate::integration::pipeline::ServoPipeline;
use crate::integration::Detector;
use crate::render::Renderer;
use crate::tracker::TrackerFactory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Escape pressed
    OperatorExit,
    /// The frame source ran out of frames
    SourceExhausted,
    /// The frame source failed; the message is the source error
    SourceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub acquisitions: u64,
    pub losses: u64,
    pub commands_sent: u64,
    pub commands_dropped: u64,
    pub final_mode: Mode,
    pub exit: ExitReason,
}

/// Owns the capture and display collaborators and the input queue, and runs a
/// [`ServoPipeline`] until the operator exits or the source ends.
pub struct ServoLoop<S, R> {
    source: S,
    renderer: R,
    events: EventQueue,
    mirror: bool,
}

impl<S: FrameSource, R: Renderer> ServoLoop<S, R> {
    /// Loop without mirroring; see [`mirror`](Self::mirror).
    pub fn new(source: S, renderer: R, events: EventQueue) -> Self {
        Self {
            source,
            renderer,
            events,
            mirror: false,
        }
    }

    /// Flip frames horizontally before they reach the pipeline, so detection,
    /// click selection and tracker seeding all see the flipped image.
    pub fn mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Run to completion. The actuator is parked at neutral on every exit path.
    pub fn run<D, F>(&mut self, pipeline: &mut ServoPipeline<D, F>) -> RunSummary
    where
        D: Detector,
        D::Error: Display,
        F: TrackerFactory,
    {
        let mut frames = 0;
        let exit = 'frames: loop {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break ExitReason::SourceExhausted,
                Err(e) => {
                    error!("frame source failed: {e}");
                    break ExitReason::SourceFailed(e.to_string());
                }
            };
            let frame = if self.mirror { frame.mirrored() } else { frame };
            frames += 1;

            let report = pipeline.process_frame(&frame);
            self.renderer.render(&frame, &report);

            for event in self.events.drain() {
                match event {
                    InputEvent::Click(point) => {
                        pipeline.handle_click(&frame, point);
                    }
                    InputEvent::Exit => break 'frames ExitReason::OperatorExit,
                }
            }
        };

        info!("stopping after {frames} frames: {exit:?}");
        pipeline.shutdown();

        let stats = pipeline.stats();
        RunSummary {
            frames,
            acquisitions: stats.acquisitions,
            losses: stats.losses,
            commands_sent: pipeline.actuator().sent(),
            commands_dropped: pipeline.actuator().dropped(),
            final_mode: pipeline.mode(),
            exit,
        }
    }
}
