// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for executor, context and run lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Job start, completion and failure
//! * Execution context start and finish, one per role
//! * Run boundaries inside a context
//! * Path splitting for parallel execution
//! * Drain and forced shutdown requests

use crate::datastore::RunKey;
use crate::engine::Statistics;
use crate::errors::ExecutionError;
use crate::module::ProcessRole;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A job started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_pathway::observability::messages::engine::JobStarted;
///
/// let msg = JobStarted {
///     mode: "parallel",
///     workers: 4,
///     modules: 3,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Starting parallel job: 3 modules, 4 workers"
/// );
/// ```
pub struct JobStarted<'a> {
    pub mode: &'a str,
    pub workers: usize,
    pub modules: usize,
}

impl Display for JobStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} job: {} modules, {} workers",
            self.mode, self.modules, self.workers
        )
    }
}

impl StructuredLog for JobStarted<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            workers = self.workers,
            modules = self.modules,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job",
            span_name = name,
            mode = self.mode,
            workers = self.workers,
        )
    }
}

/// A job finished without error.
///
/// # Log Level
/// `info!` - Important operational event
pub struct JobCompleted<'a> {
    pub mode: &'a str,
    pub events_processed: u64,
    pub events_skipped: u64,
    pub elapsed: Duration,
}

impl Display for JobCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} job completed in {:?}: {} events processed, {} skipped",
            self.mode, self.elapsed, self.events_processed, self.events_skipped
        )
    }
}

impl StructuredLog for JobCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            events_processed = self.events_processed,
            events_skipped = self.events_skipped,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("job", span_name = name, mode = self.mode)
    }
}

/// A job ended with an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct JobFailed<'a> {
    pub mode: &'a str,
    pub error: &'a ExecutionError,
}

impl Display for JobFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} job failed (exit code {}): {}",
            self.mode,
            self.error.exit_code().code(),
            self.error
        )
    }
}

impl StructuredLog for JobFailed<'_> {
    fn log(&self) {
        tracing::error!(
            mode = self.mode,
            exit_code = self.error.exit_code().code(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("job", span_name = name, mode = self.mode)
    }
}

/// An execution context is about to initialize its modules.
///
/// # Log Level
/// `info!` - Once per context; its span wraps everything the context does
pub struct ContextStarted<'a> {
    pub role: ProcessRole,
    pub modules: &'a [String],
}

impl Display for ContextStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} context with modules [{}]",
            self.role,
            self.modules.join(", ")
        )
    }
}

impl StructuredLog for ContextStarted<'_> {
    fn log(&self) {
        tracing::info!(
            role = %self.role,
            modules = self.modules.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("context", span_name = name, role = %self.role)
    }
}

/// An execution context terminated its modules.
///
/// # Log Level
/// `info!` - Once per context
pub struct ContextFinished {
    pub role: ProcessRole,
    pub processed: u64,
    pub skipped: u64,
}

impl Display for ContextFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} context finished: {} events processed, {} skipped",
            self.role, self.processed, self.skipped
        )
    }
}

impl StructuredLog for ContextFinished {
    fn log(&self) {
        tracing::info!(
            role = %self.role,
            processed = self.processed,
            skipped = self.skipped,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("context", span_name = name, role = %self.role)
    }
}

/// beginRun was delivered in a context.
///
/// # Log Level
/// `info!` - Once per run and context
pub struct RunStarted {
    pub role: ProcessRole,
    pub run: RunKey,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Begin of {} in {} context", self.run, self.role)
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            role = %self.role,
            experiment = self.run.experiment,
            run = self.run.run,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            experiment = self.run.experiment,
            run = self.run.run,
        )
    }
}

/// endRun was delivered in a context.
///
/// # Log Level
/// `info!` - Once per run and context
pub struct RunEnded {
    pub role: ProcessRole,
    pub run: RunKey,
}

impl Display for RunEnded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "End of {} in {} context", self.run, self.role)
    }
}

impl StructuredLog for RunEnded {
    fn log(&self) {
        tracing::info!(
            role = %self.role,
            experiment = self.run.experiment,
            run = self.run.run,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            experiment = self.run.experiment,
            run = self.run.run,
        )
    }
}

/// The path was divided into input, worker and output segments.
///
/// # Log Level
/// `info!` - Once per parallel job
pub struct PathSplit<'a> {
    pub input: &'a [String],
    pub worker: &'a [String],
    pub output: &'a [String],
    pub workers: usize,
}

impl Display for PathSplit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Path split: input [{}], {} x worker [{}], output [{}]",
            self.input.join(", "),
            self.workers,
            self.worker.join(", "),
            self.output.join(", ")
        )
    }
}

impl StructuredLog for PathSplit<'_> {
    fn log(&self) {
        tracing::info!(
            input = self.input.len(),
            worker = self.worker.len(),
            output = self.output.len(),
            workers = self.workers,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("split", span_name = name, workers = self.workers)
    }
}

/// Parallel execution was requested but the path runs in a single context.
///
/// # Log Level
/// `warn!` - The job still runs, without parallelism
pub struct ParallelFallback<'a> {
    pub reason: &'a str,
}

impl Display for ParallelFallback<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Falling back to single-process execution: {}", self.reason)
    }
}

impl StructuredLog for ParallelFallback<'_> {
    fn log(&self) {
        tracing::warn!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("split", span_name = name, reason = self.reason)
    }
}

/// No further events will be started; events in flight are finished.
///
/// # Log Level
/// `info!` - Operational event
pub struct DrainRequested<'a> {
    pub reason: &'a str,
}

impl Display for DrainRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Draining: {}", self.reason)
    }
}

impl StructuredLog for DrainRequested<'_> {
    fn log(&self) {
        tracing::info!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shutdown", span_name = name, reason = self.reason)
    }
}

/// A second interrupt arrived within the grace period.
///
/// # Log Level
/// `warn!` - Terminate callbacks run, their failures are swallowed
pub struct ForcedShutdownRequested {
    pub grace: Duration,
}

impl Display for ForcedShutdownRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Second interrupt within {:?}, forcing shutdown",
            self.grace
        )
    }
}

impl StructuredLog for ForcedShutdownRequested {
    fn log(&self) {
        tracing::warn!(grace_ms = self.grace.as_millis() as u64, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("shutdown", span_name = name)
    }
}

/// The configured event limit was reached.
///
/// # Log Level
/// `info!` - Operational event
pub struct EventLimitReached {
    pub role: ProcessRole,
    pub limit: u64,
}

impl Display for EventLimitReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Event limit of {} reached in {} context", self.limit, self.role)
    }
}

impl StructuredLog for EventLimitReached {
    fn log(&self) {
        tracing::info!(role = %self.role, limit = self.limit, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("context", span_name = name, role = %self.role)
    }
}

/// Per-module call counts and timings.
///
/// # Log Level
/// `info!` - End of every job
pub struct StatisticsReport<'a> {
    pub mode: &'a str,
    pub statistics: &'a Statistics,
}

impl Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Module statistics ({}):\n{}", self.mode, self.statistics)
    }
}

impl StructuredLog for StatisticsReport<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            modules = self.statistics.modules().len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("statistics", span_name = name, mode = self.mode)
    }
}
