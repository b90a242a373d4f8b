// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::parallel::ring_buffer::Frame;
use crate::errors::RingBufferError;
use std::collections::BTreeMap;

/// Holds frames that arrived ahead of their turn and releases them strictly by
/// sequence number, starting at 1.
#[derive(Debug)]
pub struct ReorderBuffer {
    pending: BTreeMap<u64, Frame>,
    next: u64,
    capacity: usize,
}

impl ReorderBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            next: 1,
            capacity,
        }
    }

    pub fn insert(&mut self, frame: Frame) -> Result<(), RingBufferError> {
        let sequence = frame.sequence;
        if sequence < self.next {
            return Err(RingBufferError::Reorder(format!(
                "sequence {} already emitted, expecting {}",
                sequence, self.next
            )));
        }
        if self.pending.contains_key(&sequence) {
            return Err(RingBufferError::Reorder(format!(
                "duplicate sequence {}",
                sequence
            )));
        }
        if self.is_full() {
            return Err(RingBufferError::Reorder(format!(
                "window of {} exceeded by sequence {} while waiting for {}",
                self.capacity, sequence, self.next
            )));
        }
        self.pending.insert(sequence, frame);
        Ok(())
    }

    /// The next frame in sequence, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<Frame> {
        let frame = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(frame)
    }

    /// Frames still waiting for a predecessor that never came.
    pub fn drain_remaining(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(buffer: &mut ReorderBuffer) -> Vec<u64> {
        std::iter::from_fn(|| buffer.pop_ready())
            .map(|f| f.sequence)
            .collect()
    }

    #[test]
    fn test_releases_in_sequence() {
        let mut buffer = ReorderBuffer::new(8);
        buffer.insert(Frame::skipped(3)).unwrap();
        buffer.insert(Frame::skipped(2)).unwrap();
        assert!(ready(&mut buffer).is_empty());

        buffer.insert(Frame::skipped(1)).unwrap();
        assert_eq!(ready(&mut buffer), vec![1, 2, 3]);
        assert_eq!(buffer.next_sequence(), 4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_rejects_stale_duplicate_and_overflow() {
        let mut buffer = ReorderBuffer::new(2);
        buffer.insert(Frame::skipped(1)).unwrap();
        assert_eq!(ready(&mut buffer), vec![1]);

        assert!(buffer.insert(Frame::skipped(1)).is_err());

        buffer.insert(Frame::skipped(3)).unwrap();
        assert!(buffer.insert(Frame::skipped(3)).is_err());

        buffer.insert(Frame::skipped(4)).unwrap();
        assert!(buffer.is_full());
        let err = buffer.insert(Frame::skipped(5)).unwrap_err();
        assert!(err.to_string().contains("window of 2"));
    }

    #[test]
    fn test_drain_remaining_returns_gaps() {
        let mut buffer = ReorderBuffer::new(4);
        buffer.insert(Frame::skipped(4)).unwrap();
        buffer.insert(Frame::skipped(2)).unwrap();

        let left: Vec<u64> = buffer.drain_remaining().iter().map(|f| f.sequence).collect();
        assert_eq!(left, vec![2, 4]);
        assert_eq!(buffer.len(), 0);
    }
}
