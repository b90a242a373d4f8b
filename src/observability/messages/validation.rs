// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for steering file loading and validation.
//!
//! This module contains message types for logging events related to:
//! * Steering file loading
//! * Validation results against the module registry

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A steering file was read and parsed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_pathway::observability::messages::validation::ConfigLoaded;
///
/// let msg = ConfigLoaded {
///     source: "steering.yaml",
///     modules: 5,
///     processes: 4,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Loaded steering file 'steering.yaml': 5 modules, 4 processes"
/// );
/// ```
pub struct ConfigLoaded<'a> {
    pub source: &'a str,
    pub modules: usize,
    pub processes: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded steering file '{}': {} modules, {} processes",
            self.source, self.modules, self.processes
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            source = self.source,
            modules = self.modules,
            processes = self.processes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("config", span_name = name, source = self.source)
    }
}

/// One problem found while validating a steering file.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_pathway::errors::ValidationError;
/// use the_pathway::observability::messages::validation::ValidationIssue;
///
/// let error = ValidationError::UnknownModuleType {
///     module_type: "Fitter".to_string(),
/// };
/// let msg = ValidationIssue { error: &error };
///
/// assert_eq!(msg.to_string(), "Validation error: Unknown module type: 'Fitter'");
/// ```
pub struct ValidationIssue<'a> {
    pub error: &'a ValidationError,
}

impl Display for ValidationIssue<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.error)
    }
}

impl StructuredLog for ValidationIssue<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("validation_issue", span_name = name, error = %self.error)
    }
}

/// Validation finished.
///
/// # Log Level
/// `debug!` when the configuration is valid, `warn!` otherwise
pub struct ValidationCompleted {
    pub modules: usize,
    pub errors: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.errors == 0 {
            write!(f, "Validated {} modules", self.modules)
        } else {
            write!(
                f,
                "Validated {} modules, found {} errors",
                self.modules, self.errors
            )
        }
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        if self.errors == 0 {
            tracing::debug!(modules = self.modules, "{}", self);
        } else {
            tracing::warn!(modules = self.modules, errors = self.errors, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("validation", span_name = name, modules = self.modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_completed_display() {
        let ok = ValidationCompleted {
            modules: 3,
            errors: 0,
        };
        assert_eq!(ok.to_string(), "Validated 3 modules");

        let failed = ValidationCompleted {
            modules: 3,
            errors: 2,
        };
        assert_eq!(failed.to_string(), "Validated 3 modules, found 2 errors");
    }
}
