//! Double-buffered frame storage
//!
//! Exactly two reusable byte buffers ("slots") exist for the lifetime of
//! the pipeline, both exclusively owned by the producer. Each cycle writes
//! into the slot not currently published, freezes it into a snapshot, and
//! reclaims the previously published slot's storage for the next write.
//! Slots grow on demand and never shrink.

use bytes::{Bytes, BytesMut};

/// Headroom applied when a slot must grow: new capacity = length * 4/3
const GROWTH_NUMERATOR: usize = 4;
const GROWTH_DENOMINATOR: usize = 3;

/// One reusable frame buffer
///
/// `buf` is `Some` while the storage is resident and writable, `None`
/// while it is lent out as the published snapshot.
#[derive(Debug, Default)]
pub struct BufferSlot {
    buf: Option<BytesMut>,
    high_water: usize,
}

impl BufferSlot {
    /// Largest capacity this slot has ever held; monotonically
    /// non-decreasing
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Current capacity, or 0 while the storage is lent out
    pub fn capacity(&self) -> usize {
        self.buf.as_ref().map(BytesMut::capacity).unwrap_or(0)
    }
}

/// The two frame slots plus the round-robin write index
#[derive(Debug)]
pub struct FrameStore {
    slots: [BufferSlot; 2],
    write_index: usize,
}

impl FrameStore {
    /// Create a store with two empty slots
    ///
    /// Storage is allocated lazily on the first load.
    pub fn new() -> Self {
        Self {
            slots: [BufferSlot::default(), BufferSlot::default()],
            write_index: 0,
        }
    }

    /// Index of the slot the next load writes into
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// The slot at the given index
    pub fn slot(&self, index: usize) -> &BufferSlot {
        &self.slots[index]
    }

    /// Copy a captured frame into the write slot, growing it first if needed
    ///
    /// If the frame does not fit, the slot is grown to `len * 4/3` bytes
    /// before the copy. An allocation failure aborts the process; a camera
    /// stream cannot run memory-starved, so there is no fallback.
    pub fn load(&mut self, frame: &[u8]) {
        let slot = &mut self.slots[self.write_index];
        let buf = slot.buf.get_or_insert_with(BytesMut::new);

        buf.clear();
        if buf.capacity() < frame.len() {
            buf.reserve(frame.len() * GROWTH_NUMERATOR / GROWTH_DENOMINATOR);
        }
        buf.extend_from_slice(frame);

        slot.high_water = slot.high_water.max(buf.capacity());
    }

    /// Freeze the write slot into a `{ptr, len}` snapshot, marking the
    /// slot's storage as lent out
    pub fn take_written(&mut self) -> Bytes {
        self.slots[self.write_index]
            .buf
            .take()
            .unwrap_or_default()
            .freeze()
    }

    /// Reclaim the previously published storage and flip the write index
    ///
    /// `prev` is the snapshot the publish swap displaced; its storage is
    /// returned to the slot it came from. The snapshot is unique by the
    /// time it reaches us (the reader only borrows inside the guard), so
    /// the reclaim reuses the same allocation. A non-unique snapshot falls
    /// back to a fresh buffer at the slot's high-water capacity, keeping
    /// capacity monotonic.
    pub fn restore_and_flip(&mut self, prev: Option<Bytes>) {
        if let Some(prev) = prev {
            let slot = &mut self.slots[1 - self.write_index];
            let mut buf = prev
                .try_into_mut()
                .unwrap_or_else(|_| BytesMut::with_capacity(slot.high_water));
            buf.clear();
            slot.high_water = slot.high_water.max(buf.capacity());
            slot.buf = Some(buf);
        }
        self.write_index = 1 - self.write_index;
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}
