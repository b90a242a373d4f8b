// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - job, context, run and shutdown events
//! * `module` - module registration and callback outcomes
//! * `store` - data store declarations
//! * `validation` - steering file validation results

pub mod engine;
pub mod module;
pub mod store;
pub mod validation;

use tracing::Span;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emits the message at its level with its fields attached.
    fn log(&self);

    /// A span carrying the same fields, for work done on behalf of the message.
    fn span(&self, name: &str) -> Span;
}
