//! Frame source abstraction
//!
//! The capture side of the pipeline is an external collaborator: something
//! that produces one complete JPEG frame per call and exposes resolution and
//! encoder quality knobs. The camera driver itself is out of scope; this
//! module only fixes its contract and ships a deterministic mock for tests
//! and demos.

use std::future::Future;

use thiserror::Error;

pub mod mock;

pub use mock::MockSource;

/// Error type for frame source operations
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Source initialization failed; propagated to the caller, never retried
    /// internally
    #[error("source initialization failed: {0}")]
    Init(String),

    /// A single capture failed; the producer skips the cycle
    #[error("frame capture failed: {0}")]
    Capture(String),
}

/// A periodic producer of JPEG-encoded frames
///
/// `capture` lends the frame buffer to the caller: the returned slice
/// borrows the source, so the borrow checker forces the caller to release
/// it before the next capture.
pub trait FrameSource: Send + 'static {
    /// Capture the next frame, returning the lent frame bytes
    fn capture(&mut self) -> impl Future<Output = Result<&[u8], SourceError>> + Send;

    /// Current frame width in pixels
    fn width(&self) -> u32;

    /// Current frame height in pixels
    fn height(&self) -> u32;

    /// Change the capture resolution
    fn set_frame_size(&mut self, size: FrameSize);

    /// Change the JPEG encoder quality (0-63, lower is higher quality)
    fn set_quality(&mut self, quality: u8);
}

/// Capture resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSize {
    /// 160x120
    Qqvga,
    /// 320x240
    Qvga,
    /// 640x480
    Vga,
    /// 800x600
    #[default]
    Svga,
    /// 1024x768
    Xga,
    /// 1280x1024
    Sxga,
    /// 1600x1200
    Uxga,
}

impl FrameSize {
    /// Width and height in pixels
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            FrameSize::Qqvga => (160, 120),
            FrameSize::Qvga => (320, 240),
            FrameSize::Vga => (640, 480),
            FrameSize::Svga => (800, 600),
            FrameSize::Xga => (1024, 768),
            FrameSize::Sxga => (1280, 1024),
            FrameSize::Uxga => (1600, 1200),
        }
    }

    /// Frame width in pixels
    pub fn width(self) -> u32 {
        self.dimensions().0
    }

    /// Frame height in pixels
    pub fn height(self) -> u32 {
        self.dimensions().1
    }
}
