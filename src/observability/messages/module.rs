// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for module registration and lifecycle callbacks.

use crate::errors::{EventLabel, FailureKind, ModuleError};
use crate::module::{AfterConditionPath, ConditionExpression, ModuleProperties, Phase, ProcessRole};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A module type was added to the registry.
///
/// # Log Level
/// `debug!` - Startup detail
///
/// # Example
/// ```
/// use the_pathway::module::ModuleProperties;
/// use the_pathway::observability::messages::module::ModuleTypeRegistered;
///
/// let msg = ModuleTypeRegistered {
///     type_name: "EventCounter",
///     parameters: 0,
///     properties: ModuleProperties::transformer(),
/// };
///
/// assert!(msg.to_string().contains("EventCounter"));
/// ```
pub struct ModuleTypeRegistered<'a> {
    pub type_name: &'a str,
    pub parameters: usize,
    pub properties: ModuleProperties,
}

impl Display for ModuleTypeRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered module type '{}' with {} parameters (parallel_safe={})",
            self.type_name, self.parameters, self.properties.parallel_safe
        )
    }
}

impl StructuredLog for ModuleTypeRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            type_name = self.type_name,
            parameters = self.parameters,
            parallel_safe = self.properties.parallel_safe,
            input = self.properties.input,
            output = self.properties.output,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("registry", span_name = name, type_name = self.type_name)
    }
}

/// A lifecycle callback returned an error.
///
/// # Log Level
/// `warn!` for recoverable failures, `error!` for fatal ones
pub struct ModuleCallFailed<'a> {
    pub module: &'a str,
    pub phase: Phase,
    pub role: ProcessRole,
    pub event: EventLabel,
    pub error: &'a ModuleError,
}

impl Display for ModuleCallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' failed in {} ({}, {}): {}",
            self.module, self.phase, self.role, self.event, self.error
        )
    }
}

impl StructuredLog for ModuleCallFailed<'_> {
    fn log(&self) {
        match self.error.kind() {
            FailureKind::Recoverable => tracing::warn!(
                module = self.module,
                phase = %self.phase,
                role = %self.role,
                event = %self.event,
                error = %self.error,
                "{}", self
            ),
            _ => tracing::error!(
                module = self.module,
                phase = %self.phase,
                role = %self.role,
                event = %self.event,
                error = %self.error,
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "module_call",
            span_name = name,
            module = self.module,
            phase = %self.phase,
        )
    }
}

/// A module other than the master announced the end of the input.
///
/// # Log Level
/// `info!` - Starts the drain
pub struct ModuleEndOfData<'a> {
    pub module: &'a str,
    pub role: ProcessRole,
    pub event: EventLabel,
}

impl Display for ModuleEndOfData<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' signalled end of data at {} in {} context",
            self.module, self.event, self.role
        )
    }
}

impl StructuredLog for ModuleEndOfData<'_> {
    fn log(&self) {
        tracing::info!(
            module = self.module,
            role = %self.role,
            event = %self.event,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("module_call", span_name = name, module = self.module)
    }
}

/// A condition matched and routed the event into a branch.
///
/// # Log Level
/// `debug!` - Per event
pub struct ConditionTaken<'a> {
    pub module: &'a str,
    pub return_value: i64,
    pub expression: &'a ConditionExpression,
    pub after: AfterConditionPath,
}

impl Display for ConditionTaken<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' returned {}, condition '{}' taken (after: {})",
            self.module, self.return_value, self.expression, self.after
        )
    }
}

impl StructuredLog for ConditionTaken<'_> {
    fn log(&self) {
        tracing::debug!(
            module = self.module,
            return_value = self.return_value,
            expression = %self.expression,
            after = %self.after,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "condition",
            span_name = name,
            module = self.module,
            expression = %self.expression,
        )
    }
}

/// Event metadata printed by the `EventInfoPrinter` module.
///
/// # Log Level
/// `info!` - Per event, requested by the path
pub struct EventInfo<'a> {
    pub module: &'a str,
    pub role: ProcessRole,
    pub event: EventLabel,
    pub production_time: u64,
}

impl Display for EventInfo<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "EventInfo: {} (time {})", self.event, self.production_time)
    }
}

impl StructuredLog for EventInfo<'_> {
    fn log(&self) {
        tracing::info!(
            module = self.module,
            role = %self.role,
            event = %self.event,
            production_time = self.production_time,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("event_info", span_name = name, event = %self.event)
    }
}

/// Final count reported by the `EventCounter` module at terminate.
///
/// # Log Level
/// `info!` - Once per context
pub struct EventsCounted<'a> {
    pub module: &'a str,
    pub role: ProcessRole,
    pub events: u64,
    pub runs: u64,
}

impl Display for EventsCounted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' counted {} events in {} runs ({} context)",
            self.module, self.events, self.runs, self.role
        )
    }
}

impl StructuredLog for EventsCounted<'_> {
    fn log(&self) {
        tracing::info!(
            module = self.module,
            role = %self.role,
            events = self.events,
            runs = self.runs,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("event_counter", span_name = name, module = self.module)
    }
}
