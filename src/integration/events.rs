//! Operator input, queued from any thread and applied on the frame loop.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::control::ClickPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Left-button press in frame coordinates
    Click(ClickPoint),
    /// Escape: stop the loop
    Exit,
}

/// Multi-producer queue drained by the frame loop.
///
/// Window and keyboard callbacks hold a [`Sender`] and only enqueue. The loop
/// drains the queue once per iteration, after the frame has been processed
/// and rendered, so a click never observes a half-built candidate list.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<InputEvent> {
        self.tx.clone()
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }
}
