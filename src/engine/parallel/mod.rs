// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Parallel Executor
//!
//! Splits a path into an input, a worker and an output segment and runs each in
//! its own execution context:
//!
//! ```text
//!  input ──(RB_in)──▶ worker-1 ──┐
//!                     worker-2   ├──(RB_out)──▶ output
//!                     worker-N ──┘
//! ```
//!
//! ## Ordering
//!
//! The input context numbers every event starting at 1. Workers finish in any
//! order; the output context holds early arrivals in a [`ReorderBuffer`] and feeds
//! its modules strictly by sequence. The input context takes a slot of an
//! [`InFlightWindow`] of `N × window_factor` before pushing an event and the
//! output context returns it when the event leaves the reorder buffer, so the
//! reorder buffer never holds more than the window.
//!
//! ## Shutdown
//!
//! End of data closes `RB_in`. Each worker drains it, shuts down and sends an
//! end-of-stream frame. The output context stops after N of them. A failing
//! context aborts the others through the shared abort token; every context still
//! runs endRun and terminate for its own modules.
//!
//! ## Fallback
//!
//! A path that cannot be split (see [`split`]) runs in a single context through
//! [`ProcessController`].

pub mod reorder;
pub mod ring_buffer;
pub mod split;
mod stages;

pub use reorder::ReorderBuffer;
pub use ring_buffer::{Frame, InFlightWindow, RingBuffer, RingConsumer, RingProducer};
pub use split::{split_path, SplitDecision, SplitPath};

use crate::config::consts::{
    DEFAULT_GRACE_PERIOD_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RING_CAPACITY,
    DEFAULT_WINDOW_FACTOR,
};
use crate::engine::controller::{log_outcome, ProcessController, RunOptions};
use crate::engine::signals::ShutdownSignals;
use crate::engine::stats::{EventCounters, ExecutionSummary, Statistics};
use crate::errors::{ExecutionError, RingBufferError};
use crate::module::ProcessRole;
use crate::observability::messages::{
    engine::{JobFailed, JobStarted, ParallelFallback, PathSplit, StatisticsReport},
    StructuredLog,
};
use crate::path::Path;
use crate::registry::ModuleRegistry;
use crate::traits::EventExecutor;
use async_trait::async_trait;
use stages::StageOutcome;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelOptions {
    pub workers: usize,
    /// Events in flight per worker
    pub window_factor: usize,
    pub ring_capacity: usize,
    pub poll_interval: Duration,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            window_factor: DEFAULT_WINDOW_FACTOR,
            ring_capacity: DEFAULT_RING_CAPACITY,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ParallelOptions {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn window_size(&self) -> usize {
        self.workers.max(1) * self.window_factor.max(1)
    }
}

/// Runs a path in one input, N worker and one output context.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    registry: Arc<ModuleRegistry>,
    options: ParallelOptions,
    run: RunOptions,
    signals: ShutdownSignals,
}

impl ParallelExecutor {
    /// `registry` builds the worker copies of the path's modules.
    pub fn new(registry: Arc<ModuleRegistry>, options: ParallelOptions, run: RunOptions) -> Self {
        Self::with_signals(
            registry,
            options,
            run,
            ShutdownSignals::new(Duration::from_millis(DEFAULT_GRACE_PERIOD_MS)),
        )
    }

    pub fn with_signals(
        registry: Arc<ModuleRegistry>,
        options: ParallelOptions,
        run: RunOptions,
        signals: ShutdownSignals,
    ) -> Self {
        Self {
            registry,
            options,
            run,
            signals,
        }
    }

    pub fn options(&self) -> ParallelOptions {
        self.options
    }

    pub fn run_options(&self) -> RunOptions {
        self.run
    }

    async fn run_split(&self, split: SplitPath) -> Result<ExecutionSummary, ExecutionError> {
        let SplitPath {
            input,
            worker,
            output,
        } = split;
        let workers = self.options.workers.max(1);

        let mut worker_paths = Vec::with_capacity(workers);
        for _ in 1..workers {
            worker_paths.push(worker.replicate(&self.registry)?);
        }
        worker_paths.insert(0, worker);

        let poll = self.options.poll_interval;
        let window_size = self.options.window_size();
        let abort = self.signals.abort_token();
        let (in_tx, in_rx) =
            RingBuffer::bounded("RB_in", self.options.ring_capacity, poll, abort.clone());
        let (out_tx, out_rx) =
            RingBuffer::bounded("RB_out", self.options.ring_capacity, poll, abort.clone());
        let (acquirer, releaser) = InFlightWindow::new(window_size, poll, abort);

        let run = self.run;
        let mut handles = Vec::with_capacity(workers + 2);
        handles.push((
            ProcessRole::Input,
            stages::spawn(ProcessRole::Input, &self.signals, move |signals| {
                stages::run_input(input, run, signals, in_tx, acquirer)
            }),
        ));
        for (index, path) in worker_paths.into_iter().enumerate() {
            let role = ProcessRole::Worker(index + 1);
            let (rx, tx) = (in_rx.clone(), out_tx.clone());
            handles.push((
                role,
                stages::spawn(role, &self.signals, move |signals| {
                    stages::run_worker(index + 1, path, run, signals, rx, tx)
                }),
            ));
        }
        drop(in_rx);
        drop(out_tx);
        handles.push((
            ProcessRole::Output,
            stages::spawn(ProcessRole::Output, &self.signals, move |signals| {
                stages::run_output(output, run, signals, workers, out_rx, releaser, window_size)
            }),
        ));

        let mut outcomes = Vec::with_capacity(handles.len());
        for (role, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.signals.abort();
                    StageOutcome::crashed(role, e.to_string())
                }
            };
            outcomes.push(outcome);
        }
        self.summarize(outcomes)
    }

    fn summarize(&self, outcomes: Vec<StageOutcome>) -> Result<ExecutionSummary, ExecutionError> {
        let mut statistics = Statistics::default();
        let mut counters = EventCounters::default();
        let mut error: Option<ExecutionError> = None;

        for outcome in outcomes {
            statistics.merge(&outcome.statistics);
            if outcome.role == ProcessRole::Output {
                counters = outcome.counters;
            }
            if let Some(e) = outcome.error {
                let replace = match &error {
                    None => true,
                    Some(current) => is_consequence(current) && !is_consequence(&e),
                };
                if replace {
                    error = Some(e);
                }
            }
        }

        StatisticsReport {
            mode: self.mode(),
            statistics: &statistics,
        }
        .log();

        match error {
            Some(e) if !is_consequence(&e) => Err(e),
            _ if self.signals.is_forced() => Err(ExecutionError::ForcedShutdown),
            Some(e) => Err(e),
            None => Ok(ExecutionSummary {
                mode: self.mode(),
                events_processed: counters.processed,
                events_skipped: counters.skipped,
                statistics,
            }),
        }
    }
}

/// Errors a context reports because a peer failed first.
pub(crate) fn is_consequence(error: &ExecutionError) -> bool {
    matches!(
        error,
        ExecutionError::RingBuffer(RingBufferError::Aborted(_))
            | ExecutionError::RingBuffer(RingBufferError::Disconnected(_))
    )
}

#[async_trait]
impl EventExecutor for ParallelExecutor {
    async fn process(&self, path: Path) -> Result<ExecutionSummary, ExecutionError> {
        let modules = path.len();
        if let Err(e) = path.check(self.run.max_branch_depth) {
            let error = ExecutionError::Configuration(e.to_string());
            JobFailed {
                mode: self.mode(),
                error: &error,
            }
            .log();
            return Err(error);
        }
        let split = match split_path(path) {
            Ok(SplitDecision::Parallel(split)) => split,
            Ok(SplitDecision::Single { path, reason }) => {
                ParallelFallback { reason: &reason }.log();
                let controller = ProcessController::with_signals(self.run, self.signals.clone());
                return controller.process(path).await;
            }
            Err(error) => {
                JobFailed {
                    mode: self.mode(),
                    error: &error,
                }
                .log();
                return Err(error);
            }
        };

        JobStarted {
            mode: self.mode(),
            workers: self.options.workers.max(1),
            modules,
        }
        .log();
        PathSplit {
            input: &split.input.module_names(),
            worker: &split.worker.module_names(),
            output: &split.output.module_names(),
            workers: self.options.workers.max(1),
        }
        .log();

        let started = Instant::now();
        let listener = self.signals.spawn_listener();
        let result = self.run_split(split).await;
        listener.abort();
        log_outcome(self.mode(), started, &result);
        result
    }

    fn mode(&self) -> &'static str {
        "parallel"
    }

    fn signals(&self) -> &ShutdownSignals {
        &self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size_scales_with_workers() {
        struct TestCase {
            workers: usize,
            factor: usize,
            expected: usize,
        }

        let cases = vec![
            TestCase {
                workers: 4,
                factor: 4,
                expected: 16,
            },
            TestCase {
                workers: 1,
                factor: 2,
                expected: 2,
            },
            TestCase {
                workers: 0,
                factor: 0,
                expected: 1,
            },
        ];

        for case in cases {
            let options = ParallelOptions {
                workers: case.workers,
                window_factor: case.factor,
                ..ParallelOptions::default()
            };
            assert_eq!(options.window_size(), case.expected);
        }
    }

    #[test]
    fn test_first_real_error_wins() {
        let executor = ParallelExecutor::new(
            Arc::new(ModuleRegistry::new()),
            ParallelOptions::with_workers(2),
            RunOptions::default(),
        );
        let fatal = ExecutionError::FatalModule {
            module: "Fitter".to_string(),
            phase: crate::module::Phase::Event,
            event: Default::default(),
            message: "boom".to_string(),
        };
        let outcome = |role: ProcessRole, error: Option<ExecutionError>| StageOutcome {
            role,
            statistics: Statistics::default(),
            counters: EventCounters::default(),
            error,
        };

        let result = executor.summarize(vec![
            outcome(
                ProcessRole::Input,
                Some(RingBufferError::Aborted("RB_in").into()),
            ),
            outcome(ProcessRole::Worker(1), Some(fatal.clone())),
            outcome(
                ProcessRole::Output,
                Some(RingBufferError::Aborted("RB_out").into()),
            ),
        ]);
        assert_eq!(result.unwrap_err(), fatal);
    }
}
