// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Single-Process Controller
//!
//! Runs a whole path inside one [`ProcessContext`]:
//!
//! ```text
//! initialize ─▶ loop { master.event ─▶ beginRun? ─▶ walk ─▶ clear event } ─▶ endRun ─▶ terminate
//! ```
//!
//! The loop stops on end of data, on the event limit, on a drain request or
//! when any module returned end-of-data. Shutdown always runs; after a forced
//! shutdown its failures are logged but not returned.

use crate::config::consts::{DEFAULT_GRACE_PERIOD_MS, DEFAULT_MAX_BRANCH_DEPTH};
use crate::engine::context::{MasterOutcome, ProcessContext, WalkStatus};
use crate::engine::plan::ExecutionPlan;
use crate::engine::signals::ShutdownSignals;
use crate::engine::stats::ExecutionSummary;
use crate::errors::ExecutionError;
use crate::module::ProcessRole;
use crate::observability::messages::{
    engine::{EventLimitReached, JobCompleted, JobFailed, JobStarted, StatisticsReport},
    StructuredLog,
};
use crate::path::Path;
use crate::traits::EventExecutor;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Limits that apply to every context of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after the master produced this many events
    pub max_events: Option<u64>,
    pub max_branch_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_events: None,
            max_branch_depth: DEFAULT_MAX_BRANCH_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessController {
    options: RunOptions,
    signals: ShutdownSignals,
}

impl ProcessController {
    pub fn new(options: RunOptions) -> Self {
        Self::with_signals(
            options,
            ShutdownSignals::new(Duration::from_millis(DEFAULT_GRACE_PERIOD_MS)),
        )
    }

    pub fn with_signals(options: RunOptions, signals: ShutdownSignals) -> Self {
        Self { options, signals }
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Runs the job on the current thread.
    pub fn run_blocking(&self, path: Path) -> Result<ExecutionSummary, ExecutionError> {
        path.check(self.options.max_branch_depth)
            .map_err(|e| ExecutionError::Configuration(e.to_string()))?;
        let plan = ExecutionPlan::compile(path);
        let mut ctx = ProcessContext::new(ProcessRole::Single, plan, self.options.max_branch_depth);
        let span = ctx.span();
        let _entered = span.enter();

        let outcome = ctx.initialize().and_then(|()| self.event_loop(&mut ctx));
        let forced = self.signals.is_forced();
        let shutdown = ctx.shutdown(forced);

        StatisticsReport {
            mode: self.mode(),
            statistics: ctx.statistics(),
        }
        .log();

        match outcome {
            Err(e) => Err(e),
            Ok(()) if forced => Err(ExecutionError::ForcedShutdown),
            Ok(()) => shutdown.map(|()| ExecutionSummary {
                mode: self.mode(),
                events_processed: ctx.counters.processed,
                events_skipped: ctx.counters.skipped,
                statistics: ctx.statistics().clone(),
            }),
        }
    }

    fn event_loop(&self, ctx: &mut ProcessContext) -> Result<(), ExecutionError> {
        let master = ctx.master_index()?;
        loop {
            if self.signals.should_stop() || ctx.stop_requested() {
                break;
            }
            if let Some(limit) = self.options.max_events {
                if ctx.counters.produced >= limit {
                    EventLimitReached {
                        role: ctx.role(),
                        limit,
                    }
                    .log();
                    break;
                }
            }

            match ctx.next_event(master)? {
                MasterOutcome::EndOfData => {
                    ctx.finish_event();
                    break;
                }
                MasterOutcome::Skipped => {
                    ctx.counters.skipped += 1;
                    ctx.finish_event();
                }
                MasterOutcome::Event(meta, return_value) => {
                    ctx.begin_run(meta.run_key())?;
                    let status = ctx.walk(1, return_value)?;
                    ctx.finish_event();
                    match status {
                        WalkStatus::Abandoned => ctx.counters.skipped += 1,
                        WalkStatus::Completed | WalkStatus::Ended => ctx.counters.processed += 1,
                    }
                }
            }
        }
        Ok(())
    }
}

/// Logs how a job ended.
pub(crate) fn log_outcome(
    mode: &str,
    started: Instant,
    result: &Result<ExecutionSummary, ExecutionError>,
) {
    match result {
        Ok(summary) => JobCompleted {
            mode,
            events_processed: summary.events_processed,
            events_skipped: summary.events_skipped,
            elapsed: started.elapsed(),
        }
        .log(),
        Err(error) => JobFailed { mode, error }.log(),
    }
}

#[async_trait]
impl EventExecutor for ProcessController {
    async fn process(&self, path: Path) -> Result<ExecutionSummary, ExecutionError> {
        JobStarted {
            mode: self.mode(),
            workers: 1,
            modules: path.len(),
        }
        .log();
        let started = Instant::now();
        let listener = self.signals.spawn_listener();

        let controller = self.clone();
        let result = tokio::task::spawn_blocking(move || controller.run_blocking(path))
            .await
            .unwrap_or_else(|e| {
                Err(ExecutionError::ContextCrashed {
                    context: ProcessRole::Single.to_string(),
                    reason: e.to_string(),
                })
            });

        listener.abort();
        log_outcome(self.mode(), started, &result);
        result
    }

    fn mode(&self) -> &'static str {
        "single"
    }

    fn signals(&self) -> &ShutdownSignals {
        &self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::journaled_registry;
    use crate::module::{AfterConditionPath, Phase};
    use crate::registry::ModuleRegistry;

    fn chain(registry: &ModuleRegistry, events: i64) -> Path {
        let mut master = registry.create("Master").unwrap();
        master.set_param("evts", events).unwrap();
        Path::from_modules([
            master,
            registry.create("Transform").unwrap(),
            registry.create("Sink").unwrap(),
        ])
    }

    #[test]
    fn test_every_event_reaches_every_module() {
        let (registry, journal) = journaled_registry();
        let controller = ProcessController::new(RunOptions::default());

        let summary = controller.run_blocking(chain(&registry, 5)).unwrap();
        assert_eq!(summary.events_processed, 5);
        assert_eq!(summary.events_skipped, 0);
        assert_eq!(summary.mode, "single");
        assert_eq!(
            summary.statistics.get("Sink").unwrap().calls(Phase::Event),
            5
        );

        let journal = journal.lock();
        assert_eq!(journal.events("Sink"), vec![1, 2, 3, 4, 5]);
        assert_eq!(journal.count("Transform", Phase::BeginRun), 1);
        assert_eq!(journal.count("Transform", Phase::EndRun), 1);
        assert_eq!(journal.count("Master", Phase::Terminate), 1);
    }

    #[test]
    fn test_end_of_data_call_is_not_counted() {
        let (registry, journal) = journaled_registry();
        let mut master = registry.create("Master").unwrap();
        master.set_param("evts", 3i64).unwrap();

        let summary = ProcessController::new(RunOptions::default())
            .run_blocking(Path::from_modules([master]))
            .unwrap();
        let master = summary.statistics.get("Master").unwrap();
        assert_eq!(master.calls(Phase::Event), 3);
        assert_eq!(master.calls(Phase::Initialize), 1);
        assert_eq!(journal.lock().events("Master"), vec![1, 2, 3]);
    }

    #[test]
    fn test_path_is_checked_before_any_event() {
        struct TestCase {
            name: &'static str,
            max_branch_depth: usize,
            duplicate_sink: bool,
            expected: &'static str,
        }

        let cases = vec![
            TestCase {
                name: "branch too deep",
                max_branch_depth: 0,
                duplicate_sink: false,
                expected: "reach depth 1, the maximum is 0",
            },
            TestCase {
                name: "duplicate module name",
                max_branch_depth: 4,
                duplicate_sink: true,
                expected: "module name 'Sink' is used more than once",
            },
        ];

        for case in cases {
            let (registry, journal) = journaled_registry();
            let mut master = registry.create("Master").unwrap();
            master.set_param("evts", 5i64).unwrap();
            let mut decider = registry.create("Decider").unwrap();
            let branch = if case.duplicate_sink {
                registry.create("Sink").unwrap()
            } else {
                registry.create("Branch").unwrap()
            };
            decider
                .if_value("== 0", Path::from_modules([branch]), AfterConditionPath::Continue)
                .unwrap();
            let path = Path::from_modules([master, decider, registry.create("Sink").unwrap()]);

            let controller = ProcessController::new(RunOptions {
                max_branch_depth: case.max_branch_depth,
                ..RunOptions::default()
            });
            let err = controller.run_blocking(path).unwrap_err();
            assert_eq!(err.exit_code().code(), 2, "{}", case.name);
            assert!(err.to_string().contains(case.expected), "{}: {}", case.name, err);
            assert!(journal.lock().entries().is_empty(), "{}", case.name);
        }
    }

    #[test]
    fn test_event_limit_stops_the_master() {
        let (registry, journal) = journaled_registry();
        let controller = ProcessController::new(RunOptions {
            max_events: Some(2),
            ..RunOptions::default()
        });

        let summary = controller.run_blocking(chain(&registry, 10)).unwrap();
        assert_eq!(summary.events_processed, 2);
        assert_eq!(journal.lock().events("Master"), vec![1, 2]);
    }

    #[test]
    fn test_master_returning_end_of_data() {
        let (registry, journal) = journaled_registry();
        let mut modules = chain(&registry, 2).into_modules();
        modules[0].set_param("returnEndOfData", true).unwrap();

        let controller = ProcessController::new(RunOptions::default());
        let summary = controller.run_blocking(Path::from_modules(modules)).unwrap();
        assert_eq!(summary.events_processed, 2);
        assert_eq!(journal.lock().count("Sink", Phase::Terminate), 1);
    }

    #[test]
    fn test_drain_before_start_still_runs_lifecycle() {
        let (registry, journal) = journaled_registry();
        let signals = ShutdownSignals::new(Duration::from_secs(1));
        signals.request_drain("test");
        let controller = ProcessController::with_signals(RunOptions::default(), signals);

        let summary = controller.run_blocking(chain(&registry, 3)).unwrap();
        assert_eq!(summary.events_processed, 0);

        let journal = journal.lock();
        assert_eq!(journal.count("Sink", Phase::Initialize), 1);
        assert_eq!(journal.count("Sink", Phase::Event), 0);
        assert_eq!(journal.count("Sink", Phase::BeginRun), 0);
        assert_eq!(journal.count("Sink", Phase::Terminate), 1);
    }

    #[test]
    fn test_forced_shutdown_reports_its_own_status() {
        let (registry, journal) = journaled_registry();
        let signals = ShutdownSignals::new(Duration::from_secs(60));
        signals.interrupt();
        signals.interrupt();
        let controller = ProcessController::with_signals(RunOptions::default(), signals);

        let err = controller.run_blocking(chain(&registry, 3)).unwrap_err();
        assert_eq!(err, ExecutionError::ForcedShutdown);
        assert_eq!(err.exit_code().code(), 4);
        assert_eq!(journal.lock().count("Transform", Phase::Terminate), 1);
    }

    #[test]
    fn test_fatal_event_stops_the_job() {
        let (registry, journal) = journaled_registry();
        let mut fatal = registry.create("Fatal").unwrap();
        fatal.set_param("onEvent", 2i64).unwrap();
        let mut master = registry.create("Master").unwrap();
        master.set_param("evts", 5i64).unwrap();
        let path = Path::from_modules([master, fatal, registry.create("Sink").unwrap()]);

        let controller = ProcessController::new(RunOptions::default());
        let err = controller.run_blocking(path).unwrap_err();
        match &err {
            ExecutionError::FatalModule { module, phase, .. } => {
                assert_eq!(module, "Fatal");
                assert_eq!(*phase, Phase::Event);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("evt 2"));

        let journal = journal.lock();
        assert_eq!(journal.events("Sink"), vec![1]);
        assert_eq!(journal.count("Sink", Phase::EndRun), 1);
        assert_eq!(journal.count("Fatal", Phase::Terminate), 1);
    }

    #[tokio::test]
    async fn test_process_runs_on_the_blocking_pool() {
        let (registry, _journal) = journaled_registry();
        let controller = ProcessController::new(RunOptions::default());
        assert_eq!(controller.mode(), "single");

        let summary = controller.process(chain(&registry, 4)).await.unwrap();
        assert_eq!(summary.events_processed, 4);
    }
}
