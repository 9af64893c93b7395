//! Frame hand-off
//!
//! A single-slot, latest-frame-wins exchange between the capture thread and
//! its consumers. Writers replace the whole slot; readers get the current
//! frame or nothing. There is no queue: a slow consumer silently skips
//! frames, and a fast consumer sees the same frame twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// One captured video frame in RGBA layout
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Pixel buffer, `width * height * 4` bytes. Shared so clones are cheap.
    pub data: Arc<Vec<u8>>,
    /// Monotonic publish sequence number
    pub seq: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::new(data),
            seq: 0,
        }
    }
}

/// Single-slot frame exchange
#[derive(Default)]
pub struct FrameSlot {
    slot: Mutex<Option<Frame>>,
    seq: AtomicU64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame, assigning the next sequence number
    pub fn publish(&self, mut frame: Frame) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        frame.seq = seq;
        *self.slot.lock() = Some(frame);
        seq
    }

    /// The most recently published frame, if any
    pub fn latest(&self) -> Option<Frame> {
        self.slot.lock().clone()
    }

    /// Sequence number of the last publish, 0 if none yet
    pub fn latest_seq(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    /// Drop the current frame (producer shutdown)
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(byte: u8) -> Frame {
        Frame::new(2, 2, vec![byte; 16])
    }

    #[test]
    fn test_publish_overwrites_whole_slot() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());

        slot.publish(frame(1));
        slot.publish(frame(2));

        let latest = slot.latest().unwrap();
        assert_eq!(latest.data[0], 2);
        assert_eq!(latest.seq, 2);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let slot = FrameSlot::new();
        let first = slot.publish(frame(1));
        let second = slot.publish(frame(2));
        assert!(second > first);
        assert_eq!(slot.latest_seq(), second);
    }

    #[test]
    fn test_slow_reader_skips_frames() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        slot.publish(frame(2));
        slot.publish(frame(3));

        // Intermediate frames are gone; only the latest is observable.
        assert_eq!(slot.latest().unwrap().data[0], 3);
    }

    #[test]
    fn test_clear_empties_slot() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        slot.clear();
        assert!(slot.latest().is_none());
        // The sequence counter keeps advancing across clears.
        assert_eq!(slot.publish(frame(2)), 2);
    }
}
