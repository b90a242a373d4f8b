// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors returned by module callbacks and by parameter binding.

use crate::errors::StoreError;
use crate::module::ParamType;
use thiserror::Error;

/// Parameter declaration, assignment and lookup failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{name}'")]
    Unknown { name: String },

    #[error("parameter '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        found: ParamType,
    },

    #[error("parameter '{name}' is declared twice")]
    Duplicate { name: String },

    #[error("parameter '{name}' cannot be changed after initialize")]
    Frozen { name: String },

    #[error("parameter '{name}' has no default and was never set")]
    NotSet { name: String },

    #[error("parameter '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

/// How the engine reacts to a failed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Skip the rest of the path for the current event only
    Recoverable,
    /// Abort the job after every initialized module got `terminate`
    Fatal,
    /// Stop once the events already in flight are finished
    EndOfData,
}

/// The non-`Ok` outcomes of a module lifecycle callback.
///
/// Store and parameter errors propagate through `?` inside module code and count as
/// fatal. During initialize the engine reports them as configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModuleError {
    #[error("recoverable error: {0}")]
    Recoverable(String),

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("end of data")]
    EndOfData,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Param(#[from] ParamError),
}

impl ModuleError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        ModuleError::Recoverable(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        ModuleError::Fatal(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ModuleError::Recoverable(_) => FailureKind::Recoverable,
            ModuleError::EndOfData => FailureKind::EndOfData,
            ModuleError::Fatal(_) | ModuleError::Store(_) | ModuleError::Param(_) => {
                FailureKind::Fatal
            }
        }
    }

    /// Store and parameter misuse; reported as a configuration error when it
    /// happens before the first event.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ModuleError::Store(_) | ModuleError::Param(_))
    }
}

/// Result of every module lifecycle callback.
pub type ModuleResult = Result<(), ModuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        struct TestCase {
            name: &'static str,
            error: ModuleError,
            kind: FailureKind,
            configuration: bool,
        }

        let cases = vec![
            TestCase {
                name: "recoverable",
                error: ModuleError::recoverable("bad hit"),
                kind: FailureKind::Recoverable,
                configuration: false,
            },
            TestCase {
                name: "fatal",
                error: ModuleError::fatal("broken"),
                kind: FailureKind::Fatal,
                configuration: false,
            },
            TestCase {
                name: "end of data",
                error: ModuleError::EndOfData,
                kind: FailureKind::EndOfData,
                configuration: false,
            },
            TestCase {
                name: "store misuse",
                error: StoreError::NotCreated {
                    name: "Tracks".to_string(),
                }
                .into(),
                kind: FailureKind::Fatal,
                configuration: true,
            },
            TestCase {
                name: "parameter misuse",
                error: ParamError::Unknown {
                    name: "cut".to_string(),
                }
                .into(),
                kind: FailureKind::Fatal,
                configuration: true,
            },
        ];

        for case in cases {
            assert_eq!(case.error.kind(), case.kind, "{}", case.name);
            assert_eq!(case.error.is_configuration(), case.configuration, "{}", case.name);
        }
    }
}
