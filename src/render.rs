//! Display collaborator.
//!
//! Overlays (boxes, status text) are for the operator only and never feed back
//! into control.

use log::{debug, info};

use crate::control::Mode;
use crate::frame::Frame;
use crate::integration::FrameReport;

pub const SELECT_HINT: &str = "Click an object to follow";
pub const LOST_TEXT: &str = "TARGET LOST";

pub trait Renderer {
    fn render(&mut self, frame: &Frame, report: &FrameReport);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _frame: &Frame, _report: &FrameReport) {}
}

/// Writes overlays to the log: per-frame detail at debug level, mode changes
/// at info level.
#[derive(Debug, Default)]
pub struct LogRenderer {
    last_mode: Option<Mode>,
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame, report: &FrameReport) {
        match report {
            FrameReport::Detection { candidates } => {
                if self.last_mode != Some(Mode::Detection) {
                    info!("{SELECT_HINT}");
                }
                for c in candidates {
                    debug!("frame {}: {}: {:.2} {}", frame.seq, c.label, c.confidence, c.bbox);
                }
            }
            FrameReport::Tracking {
                bbox,
                output,
                delivered,
                ..
            } => {
                debug!(
                    "frame {}: {} {}{}",
                    frame.seq,
                    bbox,
                    output,
                    if *delivered { "" } else { " (not sent)" }
                );
            }
            FrameReport::TargetLost { last_box } => {
                info!("frame {}: {LOST_TEXT} (last seen at {last_box})", frame.seq);
            }
        }
        self.last_mode = Some(report.mode());
    }
}
