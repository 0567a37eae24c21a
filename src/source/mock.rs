//! Deterministic frame source for tests and demos
//!
//! Produces synthetic frames without any camera hardware. Frame lengths
//! cycle through a programmable sequence and the bytes of each frame are a
//! pure function of the capture counter, so tests can reproduce the exact
//! bytes a given capture returned and assert byte-for-byte delivery.

use std::future::Future;

use super::{FrameSize, FrameSource, SourceError};

/// Frame source producing deterministic synthetic frames
#[derive(Debug)]
pub struct MockSource {
    /// Frame lengths to cycle through
    lengths: Vec<usize>,

    /// Index of the next length to use
    cursor: usize,

    /// Number of captures performed so far
    counter: u64,

    /// Backing buffer for the lent frame
    frame: Vec<u8>,

    /// Configured resolution
    frame_size: FrameSize,

    /// Configured encoder quality
    quality: u8,
}

impl MockSource {
    /// Create a mock source cycling through the given frame lengths
    ///
    /// # Panics
    ///
    /// Panics if `lengths` is empty.
    pub fn new(lengths: Vec<usize>) -> Self {
        assert!(!lengths.is_empty(), "mock source needs at least one frame length");
        Self {
            lengths,
            cursor: 0,
            counter: 0,
            frame: Vec::new(),
            frame_size: FrameSize::default(),
            quality: 12,
        }
    }

    /// Create a mock source with an explicit resolution
    pub fn with_frame_size(lengths: Vec<usize>, size: FrameSize) -> Self {
        let mut source = Self::new(lengths);
        source.frame_size = size;
        source
    }

    /// Number of captures performed so far
    pub fn captures(&self) -> u64 {
        self.counter
    }

    /// Configured encoder quality
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// The exact bytes the `counter`-th capture produces at the given length
    ///
    /// The first capture has counter 1. The first eight bytes encode the
    /// counter little-endian so a delivered frame identifies which capture
    /// it came from; the rest is a counter-seeded pattern.
    pub fn expected_frame(counter: u64, len: usize) -> Vec<u8> {
        let mut frame = vec![0u8; len];
        let header = counter.to_le_bytes();
        let head_len = len.min(header.len());
        frame[..head_len].copy_from_slice(&header[..head_len]);
        for (i, byte) in frame.iter_mut().enumerate().skip(head_len) {
            *byte = ((counter as usize).wrapping_mul(31).wrapping_add(i) % 251) as u8;
        }
        frame
    }
}

impl FrameSource for MockSource {
    fn capture(&mut self) -> impl Future<Output = Result<&[u8], SourceError>> + Send {
        async move {
            self.counter += 1;
            let len = self.lengths[self.cursor];
            self.cursor = (self.cursor + 1) % self.lengths.len();
            self.frame = Self::expected_frame(self.counter, len);
            Ok(self.frame.as_slice())
        }
    }

    fn width(&self) -> u32 {
        self.frame_size.width()
    }

    fn height(&self) -> u32 {
        self.frame_size.height()
    }

    fn set_frame_size(&mut self, size: FrameSize) {
        self.frame_size = size;
    }

    fn set_quality(&mut self, quality: u8) {
        self.quality = quality;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_matches_expected_frame() {
        let mut source = MockSource::new(vec![100]);

        let frame = source.capture().await.unwrap().to_vec();
        assert_eq!(frame, MockSource::expected_frame(1, 100));

        let frame = source.capture().await.unwrap().to_vec();
        assert_eq!(frame, MockSource::expected_frame(2, 100));
    }

    #[tokio::test]
    async fn test_lengths_cycle() {
        let mut source = MockSource::new(vec![10, 20, 30]);

        assert_eq!(source.capture().await.unwrap().len(), 10);
        assert_eq!(source.capture().await.unwrap().len(), 20);
        assert_eq!(source.capture().await.unwrap().len(), 30);
        assert_eq!(source.capture().await.unwrap().len(), 10);
        assert_eq!(source.captures(), 4);
    }

    #[tokio::test]
    async fn test_two_sources_are_identical() {
        let mut a = MockSource::new(vec![64, 128]);
        let mut b = MockSource::new(vec![64, 128]);

        for _ in 0..4 {
            let fa = a.capture().await.unwrap().to_vec();
            let fb = b.capture().await.unwrap().to_vec();
            assert_eq!(fa, fb);
        }
    }

    #[test]
    fn test_frame_size_accessors() {
        let mut source = MockSource::with_frame_size(vec![10], FrameSize::Vga);
        assert_eq!(source.width(), 640);
        assert_eq!(source.height(), 480);

        source.set_frame_size(FrameSize::Qvga);
        assert_eq!(source.width(), 320);
        assert_eq!(source.height(), 240);

        source.set_quality(20);
        assert_eq!(source.quality(), 20);
    }

    #[test]
    #[should_panic(expected = "at least one frame length")]
    fn test_empty_lengths_panics() {
        let _ = MockSource::new(Vec::new());
    }
}
