// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded ring buffers of framed events between execution contexts.
//!
//! Wire layout of one frame, little endian:
//!
//! ```text
//! ┌──────────────┬────────────┬──────────────┬─────────────────────┐
//! │ sequence u64 │ flags u32  │ length u32   │ payload (length)    │
//! └──────────────┴────────────┴──────────────┴─────────────────────┘
//! ```
//!
//! Producers block while the buffer is full and consumers while it is empty.
//! Both wake up every poll interval to check the abort token, so a failing peer
//! never leaves a context blocked forever.

use crate::errors::RingBufferError;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sequence: u64,
    pub flags: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    /// The producer will send nothing more
    pub const END_OF_STREAM: u32 = 1;
    /// Run-change marker: the event opens a new run, so the run of the previous
    /// event has ended. The output context closes that run on seeing it.
    pub const END_OF_RUN: u32 = 2;
    /// The producer failed; the payload holds the message
    pub const ERROR: u32 = 4;
    /// The event was abandoned upstream and carries no payload
    pub const SKIPPED: u32 = 8;
    /// A condition ended the event before the output segment
    pub const ENDED: u32 = 16;

    pub fn event(sequence: u64, payload: Vec<u8>, run_changed: bool) -> Self {
        Self {
            sequence,
            flags: if run_changed { Self::END_OF_RUN } else { 0 },
            payload,
        }
    }

    pub fn skipped(sequence: u64) -> Self {
        Self {
            sequence,
            flags: Self::SKIPPED,
            payload: Vec::new(),
        }
    }

    pub fn ended(sequence: u64) -> Self {
        Self {
            sequence,
            flags: Self::ENDED,
            payload: Vec::new(),
        }
    }

    pub fn end_of_stream() -> Self {
        Self {
            sequence: 0,
            flags: Self::END_OF_STREAM,
            payload: Vec::new(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            sequence: 0,
            flags: Self::ERROR,
            payload: message.as_bytes().to_vec(),
        }
    }

    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.has(Self::END_OF_STREAM)
    }

    pub fn is_error(&self) -> bool {
        self.has(Self::ERROR)
    }

    pub fn is_skipped(&self) -> bool {
        self.has(Self::SKIPPED)
    }

    pub fn is_ended(&self) -> bool {
        self.has(Self::ENDED)
    }

    pub fn is_run_change(&self) -> bool {
        self.has(Self::END_OF_RUN)
    }

    pub fn error_message(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn encode(&self) -> Result<Vec<u8>, RingBufferError> {
        let length = u32::try_from(self.payload.len())
            .map_err(|_| RingBufferError::PayloadTooLarge(self.payload.len()))?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&self.sequence.to_le_bytes());
        bytes.extend_from_slice(&self.flags.to_le_bytes());
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RingBufferError> {
        if bytes.len() < HEADER_LEN {
            return Err(RingBufferError::TruncatedHeader {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let (header, payload) = bytes.split_at(HEADER_LEN);
        let mut sequence = [0u8; 8];
        sequence.copy_from_slice(&header[0..8]);
        let mut flags = [0u8; 4];
        flags.copy_from_slice(&header[8..12]);
        let mut length = [0u8; 4];
        length.copy_from_slice(&header[12..16]);

        let length = u32::from_le_bytes(length) as usize;
        if length != payload.len() {
            return Err(RingBufferError::PayloadLength {
                expected: length,
                actual: payload.len(),
            });
        }
        Ok(Self {
            sequence: u64::from_le_bytes(sequence),
            flags: u32::from_le_bytes(flags),
            payload: payload.to_vec(),
        })
    }
}

/// Constructor for a connected producer/consumer pair.
pub struct RingBuffer;

impl RingBuffer {
    pub fn bounded(
        name: &'static str,
        capacity: usize,
        poll: Duration,
        abort: CancellationToken,
    ) -> (RingProducer, RingConsumer) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (
            RingProducer {
                name,
                tx,
                poll,
                abort: abort.clone(),
            },
            RingConsumer {
                name,
                rx,
                poll,
                abort,
            },
        )
    }
}

/// Write side; clone one per producing context. The consumer sees end of
/// input once every clone is dropped.
#[derive(Debug, Clone)]
pub struct RingProducer {
    name: &'static str,
    tx: Sender<Vec<u8>>,
    poll: Duration,
    abort: CancellationToken,
}

impl RingProducer {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Blocks while the buffer is full.
    pub fn push(&self, frame: &Frame) -> Result<(), RingBufferError> {
        let mut bytes = frame.encode()?;
        loop {
            if self.abort.is_cancelled() {
                return Err(RingBufferError::Aborted(self.name));
            }
            match self.tx.send_timeout(bytes, self.poll) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => bytes = returned,
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(RingBufferError::Disconnected(self.name))
                }
            }
        }
    }

    /// One attempt that ignores the abort token and waits at most one poll
    /// interval. Used to report failures after an abort.
    pub fn try_push(&self, frame: &Frame) -> Result<(), RingBufferError> {
        let bytes = frame.encode()?;
        self.tx.send_timeout(bytes, self.poll).map_err(|e| match e {
            SendTimeoutError::Timeout(_) => RingBufferError::Aborted(self.name),
            SendTimeoutError::Disconnected(_) => RingBufferError::Disconnected(self.name),
        })
    }
}

/// Read side; clones share one queue, each frame goes to exactly one of them.
#[derive(Debug, Clone)]
pub struct RingConsumer {
    name: &'static str,
    rx: Receiver<Vec<u8>>,
    poll: Duration,
    abort: CancellationToken,
}

impl RingConsumer {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Blocks while the buffer is empty. `Ok(None)` once every producer is gone
    /// and the buffer is drained.
    ///
    /// After an abort the only frame still delivered is an error frame queued by
    /// the producer that failed.
    pub fn pop(&self) -> Result<Option<Frame>, RingBufferError> {
        loop {
            if self.abort.is_cancelled() {
                return match self.pending_error() {
                    Some(frame) => Ok(Some(frame)),
                    None => Err(RingBufferError::Aborted(self.name)),
                };
            }
            match self.rx.recv_timeout(self.poll) {
                Ok(bytes) => return Frame::decode(&bytes).map(Some),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }

    fn pending_error(&self) -> Option<Frame> {
        self.rx
            .try_iter()
            .filter_map(|bytes| Frame::decode(&bytes).ok())
            .find(Frame::is_error)
    }
}

/// Counting semaphore bounding how many sequenced events are between the input
/// context and the output context at once. The reorder buffer can never hold
/// more than the window size.
pub struct InFlightWindow;

impl InFlightWindow {
    pub fn new(
        size: usize,
        poll: Duration,
        abort: CancellationToken,
    ) -> (WindowAcquirer, WindowReleaser) {
        let (tx, rx) = crossbeam_channel::bounded(size.max(1));
        (
            WindowAcquirer { tx, poll, abort },
            WindowReleaser { rx },
        )
    }
}

#[derive(Debug)]
pub struct WindowAcquirer {
    tx: Sender<()>,
    poll: Duration,
    abort: CancellationToken,
}

impl WindowAcquirer {
    /// Takes one slot, blocking while the window is full.
    pub fn acquire(&self) -> Result<(), RingBufferError> {
        loop {
            if self.abort.is_cancelled() {
                return Err(RingBufferError::Aborted("window"));
            }
            match self.tx.send_timeout((), self.poll) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(())) => continue,
                Err(SendTimeoutError::Disconnected(())) => {
                    return Err(RingBufferError::Disconnected("window"))
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct WindowReleaser {
    rx: Receiver<()>,
}

impl WindowReleaser {
    pub fn release(&self) {
        let _ = self.rx.try_recv();
    }

    pub fn in_flight(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const POLL: Duration = Duration::from_millis(5);

    #[test]
    fn test_frame_header_layout() {
        let frame = Frame::event(0x0102, b"abc".to_vec(), true);
        let bytes = frame.encode().unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + 3);
        assert_eq!(&bytes[0..8], &0x0102u64.to_le_bytes());
        assert_eq!(&bytes[8..12], &Frame::END_OF_RUN.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(&bytes[16..], b"abc");
        assert_eq!(Frame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        struct TestCase {
            name: &'static str,
            bytes: Vec<u8>,
            expected: RingBufferError,
        }

        let mut short_payload = Frame::event(1, b"abcd".to_vec(), false).encode().unwrap();
        short_payload.truncate(HEADER_LEN + 2);

        let cases = vec![
            TestCase {
                name: "empty",
                bytes: Vec::new(),
                expected: RingBufferError::TruncatedHeader {
                    expected: HEADER_LEN,
                    actual: 0,
                },
            },
            TestCase {
                name: "half a header",
                bytes: vec![0; 8],
                expected: RingBufferError::TruncatedHeader {
                    expected: HEADER_LEN,
                    actual: 8,
                },
            },
            TestCase {
                name: "payload shorter than announced",
                bytes: short_payload,
                expected: RingBufferError::PayloadLength {
                    expected: 4,
                    actual: 2,
                },
            },
        ];

        for case in cases {
            assert_eq!(
                Frame::decode(&case.bytes).unwrap_err(),
                case.expected,
                "case '{}'",
                case.name
            );
        }
    }

    #[test]
    fn test_flags() {
        assert!(Frame::end_of_stream().is_end_of_stream());
        assert!(Frame::skipped(4).is_skipped());
        let error = Frame::error("worker-1 failed");
        assert!(error.is_error());
        assert_eq!(error.error_message(), "worker-1 failed");
        assert!(!Frame::event(1, Vec::new(), false).has(Frame::END_OF_RUN));
    }

    #[test]
    fn test_fifo_and_disconnect() {
        let (producer, consumer) = RingBuffer::bounded("RB_in", 4, POLL, CancellationToken::new());
        for sequence in 1..=3 {
            producer.push(&Frame::skipped(sequence)).unwrap();
        }
        drop(producer);

        let sequences: Vec<u64> = std::iter::from_fn(|| consumer.pop().unwrap())
            .map(|f| f.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_full_buffer_blocks_until_consumed() {
        let (producer, consumer) = RingBuffer::bounded("RB_out", 1, POLL, CancellationToken::new());
        producer.push(&Frame::skipped(1)).unwrap();

        let handle = thread::spawn(move || {
            producer.push(&Frame::skipped(2)).unwrap();
        });
        thread::sleep(Duration::from_millis(20));
        assert_eq!(consumer.pop().unwrap().unwrap().sequence, 1);
        handle.join().unwrap();
        assert_eq!(consumer.pop().unwrap().unwrap().sequence, 2);
    }

    #[test]
    fn test_abort_unblocks_producer_and_consumer() {
        let abort = CancellationToken::new();
        let (producer, consumer) = RingBuffer::bounded("RB_in", 1, POLL, abort.clone());
        producer.push(&Frame::skipped(1)).unwrap();

        let blocked = thread::spawn(move || producer.push(&Frame::skipped(2)));
        thread::sleep(Duration::from_millis(20));
        abort.cancel();

        assert_eq!(
            blocked.join().unwrap(),
            Err(RingBufferError::Aborted("RB_in"))
        );
        assert_eq!(consumer.pop(), Err(RingBufferError::Aborted("RB_in")));
    }

    #[test]
    fn test_error_frame_survives_abort() {
        let abort = CancellationToken::new();
        let (producer, consumer) = RingBuffer::bounded("RB_out", 4, POLL, abort.clone());
        producer.push(&Frame::skipped(1)).unwrap();
        producer.push(&Frame::error("worker-2: boom")).unwrap();
        producer.push(&Frame::skipped(2)).unwrap();
        abort.cancel();

        let frame = consumer.pop().unwrap().unwrap();
        assert!(frame.is_error());
        assert_eq!(frame.error_message(), "worker-2: boom");
        assert_eq!(consumer.pop(), Err(RingBufferError::Aborted("RB_out")));
    }

    #[test]
    fn test_window_bounds_in_flight_events() {
        let abort = CancellationToken::new();
        let (acquirer, releaser) = InFlightWindow::new(2, POLL, abort.clone());
        acquirer.acquire().unwrap();
        acquirer.acquire().unwrap();
        assert_eq!(releaser.in_flight(), 2);

        let blocked = thread::spawn(move || acquirer.acquire());
        thread::sleep(Duration::from_millis(20));
        releaser.release();
        blocked.join().unwrap().unwrap();
        assert_eq!(releaser.in_flight(), 2);
    }
}
