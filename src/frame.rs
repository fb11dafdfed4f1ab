//! Video frames and the capture-side collaborator.

use ndarray::{Array3, s};

use crate::error::Result;

/// A captured video frame.
///
/// Pixels are stored row-major as `(height, width, channels)`. `seq` is the
/// capture index, starting at 0 for the first frame a source produces.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub pixels: Array3<u8>,
}

impl Frame {
    pub fn new(seq: u64, pixels: Array3<u8>) -> Self {
        Self { seq, pixels }
    }

    /// A black 3-channel frame, used by sources that carry no image data.
    pub fn blank(seq: u64, width: u32, height: u32) -> Self {
        Self {
            seq,
            pixels: Array3::zeros((height as usize, width as usize, 3)),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }

    /// Horizontally flipped copy (selfie view).
    ///
    /// Capture applies this before detection so that click coordinates taken
    /// from the displayed image line up with detector boxes.
    pub fn mirrored(&self) -> Self {
        Self {
            seq: self.seq,
            pixels: self.pixels.slice(s![.., ..;-1, ..]).to_owned(),
        }
    }
}

/// Capture collaborator.
///
/// `Ok(None)` means the source is exhausted. Both exhaustion and an error end
/// the frame loop.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
