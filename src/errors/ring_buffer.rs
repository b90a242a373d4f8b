// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures on the ring buffers connecting execution contexts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RingBufferError {
    #[error("ring buffer '{0}' lost its peer")]
    Disconnected(&'static str),

    /// A peer requested abort while this side was blocked.
    #[error("ring buffer '{0}' was aborted")]
    Aborted(&'static str),

    #[error("frame header needs {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("frame header announces {expected} payload bytes, got {actual}")]
    PayloadLength { expected: usize, actual: usize },

    #[error("frame payload of {0} bytes does not fit the header")]
    PayloadTooLarge(usize),

    #[error("reorder buffer: {0}")]
    Reorder(String),

    #[error("event payload: {0}")]
    Payload(String),
}
