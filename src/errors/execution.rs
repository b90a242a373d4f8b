// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Job-level errors and the exit status each of them maps to.

use crate::datastore::EventMetaData;
use crate::errors::{RegistryError, RingBufferError, ValidationError};
use crate::module::Phase;
use std::fmt;
use thiserror::Error;

/// Process exit status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    FatalModule = 1,
    Configuration = 2,
    SplitFailure = 3,
    ForcedShutdown = 4,
    RingBufferIo = 5,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// The `(experiment, run, event)` tuple attached to runtime error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventLabel(pub Option<(u32, u32, u64)>);

impl From<Option<&EventMetaData>> for EventLabel {
    fn from(meta: Option<&EventMetaData>) -> Self {
        EventLabel(meta.map(|m| (m.experiment, m.run, m.event)))
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((experiment, run, event)) => {
                write!(f, "exp {} run {} evt {}", experiment, run, event)
            }
            None => write!(f, "no event"),
        }
    }
}

/// Errors that end a job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot split the path for parallel processing: module '{module}' is not parallel-safe")]
    SplitRefused { module: String },

    #[error("module '{module}' failed during {phase} ({event}): {message}")]
    FatalModule {
        module: String,
        phase: Phase,
        event: EventLabel,
        message: String,
    },

    #[error("{context} terminated abnormally: {reason}")]
    ContextCrashed { context: String, reason: String },

    #[error("forced shutdown after repeated interrupt")]
    ForcedShutdown,

    #[error(transparent)]
    RingBuffer(#[from] RingBufferError),
}

impl ExecutionError {
    pub fn exit_code(&self) -> ExitStatus {
        match self {
            ExecutionError::Configuration(_) => ExitStatus::Configuration,
            ExecutionError::SplitRefused { .. } => ExitStatus::SplitFailure,
            ExecutionError::FatalModule { .. } | ExecutionError::ContextCrashed { .. } => {
                ExitStatus::FatalModule
            }
            ExecutionError::ForcedShutdown => ExitStatus::ForcedShutdown,
            ExecutionError::RingBuffer(_) => ExitStatus::RingBufferIo,
        }
    }
}

impl From<ValidationError> for ExecutionError {
    fn from(error: ValidationError) -> Self {
        ExecutionError::Configuration(error.to_string())
    }
}

impl From<RegistryError> for ExecutionError {
    fn from(error: RegistryError) -> Self {
        ExecutionError::Configuration(error.to_string())
    }
}
