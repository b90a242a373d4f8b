// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Execution Context
//!
//! A [`ProcessContext`] is one isolated execution context: its own
//! [`DataStore`], its own module instances and its own statistics. The single
//! process controller runs one; the parallel executor runs one input context, N
//! worker contexts and one output context. Nothing inside a context is shared.
//!
//! ## Lifecycle
//!
//! ```text
//! initialize()                      modules in lifecycle order
//! ┌─ per event ───────────────────────────────────────────────┐
//! │ next_event(master) | restore(snapshot)                    │
//! │ begin_run(key)     endRun of the old run, beginRun of new │
//! │ walk(start, rv)    event callbacks, conditions, branches  │
//! │ finish_event()     event entries cleared                  │
//! └───────────────────────────────────────────────────────────┘
//! shutdown(swallow)                 endRun, then terminate in reverse order
//! ```
//!
//! Failure handling follows the module result:
//! - **recoverable**: the walk stops, the event is abandoned, the loop continues
//! - **end of data**: the current event is finished, then the context stops
//! - **fatal**: the walk returns an error; the caller shuts the context down

use crate::datastore::{
    DataStore, Durability, EventMetaData, EventSnapshot, RunKey, StorePhase, EVENT_METADATA,
};
use crate::engine::condition::{ConditionEvaluator, Continuation, ContinuationStack};
use crate::engine::plan::{ExecutionPlan, ModuleIndex, MAIN_SEQUENCE};
use crate::engine::stats::{EventCounters, Statistics};
use crate::errors::{
    EventLabel, ExecutionError, FailureKind, ModuleError, ModuleResult, RingBufferError,
};
use crate::module::{AfterConditionPath, Phase, ProcessRole};
use crate::observability::messages::{
    engine::{ContextFinished, ContextStarted, RunEnded, RunStarted},
    module::{ConditionTaken, ModuleCallFailed, ModuleEndOfData},
    StructuredLog,
};
use std::time::{Duration, Instant};
use tracing::Span;

/// Result of asking the master module for the next event.
#[derive(Debug, Clone, PartialEq)]
pub enum MasterOutcome {
    /// A new event and the master's return value
    Event(EventMetaData, Option<i64>),
    /// The master abandoned this event
    Skipped,
    EndOfData,
}

/// How the walk over one event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Every module on the route ran
    Completed,
    /// A condition with `end` policy finished the event early
    Ended,
    /// A module failed recoverably
    Abandoned,
}

pub struct ProcessContext {
    role: ProcessRole,
    plan: ExecutionPlan,
    store: DataStore,
    statistics: Statistics,
    slots: Vec<usize>,
    initialized: Vec<ModuleIndex>,
    open_runs: Vec<bool>,
    current_run: Option<RunKey>,
    max_branch_depth: usize,
    stop_requested: bool,
    pub counters: EventCounters,
}

impl ProcessContext {
    pub fn new(role: ProcessRole, plan: ExecutionPlan, max_branch_depth: usize) -> Self {
        let names = plan.names();
        let statistics = Statistics::with_modules(plan.lifecycle().iter().map(|&i| names[i].as_str()));
        let mut slots = vec![0; plan.len()];
        for (slot, &index) in plan.lifecycle().iter().enumerate() {
            slots[index] = slot;
        }
        let open_runs = vec![false; plan.len()];
        Self {
            role,
            plan,
            store: DataStore::new(),
            statistics,
            slots,
            initialized: Vec::new(),
            open_runs,
            current_run: None,
            max_branch_depth,
            stop_requested: false,
            counters: EventCounters::default(),
        }
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Set when a module returned end-of-data; the context finishes the current
    /// event and stops.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Span every log line of this context is attached to.
    pub fn span(&self) -> Span {
        let names: Vec<String> = self
            .plan
            .main()
            .iter()
            .map(|&i| self.plan.module(i).instance.name().to_string())
            .collect();
        let started = ContextStarted {
            role: self.role,
            modules: &names,
        };
        started.log();
        started.span("context")
    }

    fn module_name(&self, index: ModuleIndex) -> String {
        self.plan.module(index).instance.name().to_string()
    }

    fn event_label(&self) -> EventLabel {
        EventLabel::from(self.store.event_metadata())
    }

    fn call(&mut self, index: ModuleIndex, phase: Phase) -> (ModuleResult, Option<i64>) {
        let (result, return_value, elapsed) = self.invoke(index, phase);
        self.statistics.record(self.slots[index], phase, elapsed);
        (result, return_value)
    }

    /// Runs a callback without recording it in the statistics.
    fn invoke(&mut self, index: ModuleIndex, phase: Phase) -> (ModuleResult, Option<i64>, Duration) {
        let started = Instant::now();
        let (result, return_value) = self
            .plan
            .module_mut(index)
            .instance
            .call(phase, &mut self.store, self.role);
        (result, return_value, started.elapsed())
    }

    fn report(&self, index: ModuleIndex, phase: Phase, error: &ModuleError) {
        let module = self.module_name(index);
        ModuleCallFailed {
            module: &module,
            phase,
            role: self.role,
            event: self.event_label(),
            error,
        }
        .log();
    }

    fn fatal(&self, index: ModuleIndex, phase: Phase, error: &ModuleError) -> ExecutionError {
        self.report(index, phase, error);
        ExecutionError::FatalModule {
            module: self.module_name(index),
            phase,
            event: self.event_label(),
            message: error.to_string(),
        }
    }

    fn end_of_data(&mut self, index: ModuleIndex) {
        let module = self.module_name(index);
        ModuleEndOfData {
            module: &module,
            role: self.role,
            event: self.event_label(),
        }
        .log();
        self.stop_requested = true;
    }

    /// Initializes every module in lifecycle order. Parameter and store misuse
    /// is a configuration error; any other failure is fatal. Modules initialized
    /// before a failure are still terminated by [`shutdown`](Self::shutdown).
    pub fn initialize(&mut self) -> Result<(), ExecutionError> {
        if matches!(self.role, ProcessRole::Worker(_) | ProcessRole::Output) {
            self.store
                .declare_object::<EventMetaData>(EVENT_METADATA, Durability::Persistent)
                .map_err(|e| ExecutionError::Configuration(e.to_string()))?;
        }

        let lifecycle = self.plan.lifecycle().to_vec();
        for &index in &lifecycle {
            if let Err(e) = self.plan.module(index).instance.params().check_forced() {
                return Err(ExecutionError::Configuration(format!(
                    "module '{}': {}",
                    self.module_name(index),
                    e
                )));
            }
        }

        for &index in &lifecycle {
            let name = self.module_name(index);
            self.store.set_current_module(Some(name));
            let (result, _) = self.call(index, Phase::Initialize);
            self.store.set_current_module(None);
            self.plan.module_mut(index).instance.freeze_params();

            match result {
                Ok(()) => self.initialized.push(index),
                Err(ModuleError::EndOfData) => {
                    self.initialized.push(index);
                    self.end_of_data(index);
                }
                Err(e) if e.is_configuration() => {
                    self.report(index, Phase::Initialize, &e);
                    return Err(ExecutionError::Configuration(format!(
                        "module '{}' failed to initialize: {}",
                        self.module_name(index),
                        e
                    )));
                }
                Err(e) => return Err(self.fatal(index, Phase::Initialize, &e)),
            }
        }

        self.store.set_phase(StorePhase::Run);
        Ok(())
    }

    /// The master is the module that declared the event metadata; it has to be the
    /// first module of the main path.
    pub fn master_index(&self) -> Result<ModuleIndex, ExecutionError> {
        let Some(&first) = self.plan.main().first() else {
            return Err(ExecutionError::Configuration("the path is empty".to_string()));
        };
        match self.store.declared_by(EVENT_METADATA, Durability::Persistent) {
            Some(name) if name == self.plan.module(first).instance.name() => Ok(first),
            Some(name) => Err(ExecutionError::Configuration(format!(
                "module '{}' declares {} but is not the first module of the path",
                name, EVENT_METADATA
            ))),
            None => Err(ExecutionError::Configuration(format!(
                "no module declares {}; the path must start with an input module",
                EVENT_METADATA
            ))),
        }
    }

    pub fn begin_event(&mut self) {
        self.store.set_phase(StorePhase::Event);
    }

    pub fn finish_event(&mut self) {
        self.store.clear_event();
        self.store.set_phase(StorePhase::Run);
    }

    /// Opens an event and runs the master's `event` callback. The call that
    /// reports end of data is not an event and is left out of the statistics.
    pub fn next_event(&mut self, master: ModuleIndex) -> Result<MasterOutcome, ExecutionError> {
        self.begin_event();
        let (result, return_value, elapsed) = self.invoke(master, Phase::Event);
        let outcome = match result {
            Err(e) => match e.kind() {
                FailureKind::EndOfData => Ok(MasterOutcome::EndOfData),
                FailureKind::Recoverable => {
                    self.report(master, Phase::Event, &e);
                    Ok(MasterOutcome::Skipped)
                }
                FailureKind::Fatal => Err(self.fatal(master, Phase::Event, &e)),
            },
            Ok(()) => match self.store.event_metadata() {
                Some(meta) if !meta.end_of_data => {
                    self.counters.produced += 1;
                    Ok(MasterOutcome::Event(meta.clone(), return_value))
                }
                _ => Ok(MasterOutcome::EndOfData),
            },
        };
        if !matches!(outcome, Ok(MasterOutcome::EndOfData)) {
            self.statistics.record(self.slots[master], Phase::Event, elapsed);
        }
        outcome
    }

    /// Delivers endRun for the previous run and beginRun for `key` when the run
    /// changed.
    pub fn begin_run(&mut self, key: RunKey) -> Result<(), ExecutionError> {
        if self.current_run == Some(key) {
            return Ok(());
        }
        self.close_runs(false)?;

        let phase = self.store.phase();
        self.store.set_phase(StorePhase::Run);
        self.current_run = Some(key);
        RunStarted {
            role: self.role,
            run: key,
        }
        .log();

        let mut failure = None;
        for index in self.initialized.clone() {
            let (result, _) = self.call(index, Phase::BeginRun);
            match result {
                Ok(()) => self.open_runs[index] = true,
                Err(ModuleError::EndOfData) => {
                    self.open_runs[index] = true;
                    self.end_of_data(index);
                }
                Err(e) => {
                    failure = Some(self.fatal(index, Phase::BeginRun, &e));
                    break;
                }
            }
        }
        self.store.set_phase(phase);
        failure.map_or(Ok(()), Err)
    }

    /// Delivers endRun to every module with an open run.
    pub fn end_runs(&mut self) -> Result<(), ExecutionError> {
        self.close_runs(false)
    }

    fn close_runs(&mut self, swallow: bool) -> Result<(), ExecutionError> {
        let Some(key) = self.current_run.take() else {
            return Ok(());
        };
        let phase = self.store.phase();
        self.store.set_phase(StorePhase::Run);

        let mut failure = None;
        for index in self.initialized.clone() {
            if !std::mem::replace(&mut self.open_runs[index], false) {
                continue;
            }
            let (result, _) = self.call(index, Phase::EndRun);
            match result {
                Ok(()) | Err(ModuleError::EndOfData) => {}
                Err(e) if swallow => self.report(index, Phase::EndRun, &e),
                Err(e) => {
                    let error = self.fatal(index, Phase::EndRun, &e);
                    failure.get_or_insert(error);
                }
            }
        }
        self.store.set_phase(phase);
        RunEnded {
            role: self.role,
            run: key,
        }
        .log();
        failure.map_or(Ok(()), Err)
    }

    fn terminate(&mut self, swallow: bool) -> Result<(), ExecutionError> {
        let mut failure = None;
        while let Some(index) = self.initialized.pop() {
            let (result, _) = self.call(index, Phase::Terminate);
            match result {
                Ok(()) | Err(ModuleError::EndOfData) => {}
                Err(e) if swallow => self.report(index, Phase::Terminate, &e),
                Err(e) => {
                    let error = self.fatal(index, Phase::Terminate, &e);
                    failure.get_or_insert(error);
                }
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Ends open runs, then terminates every initialized module in reverse order.
    /// Every module gets its callbacks even when an earlier one fails; the first
    /// failure is returned unless `swallow` is set.
    pub fn shutdown(&mut self, swallow: bool) -> Result<(), ExecutionError> {
        self.store.set_phase(StorePhase::Run);
        let runs = self.close_runs(swallow);
        let terminated = self.terminate(swallow);
        self.store.clear_persistent();
        ContextFinished {
            role: self.role,
            processed: self.counters.processed,
            skipped: self.counters.skipped,
        }
        .log();
        runs.and(terminated)
    }

    /// Walks the main path from `start`. When the walk resumes after a module that
    /// already ran (the master), its return value is passed in `carried` so its
    /// conditions are evaluated first.
    pub fn walk(&mut self, start: usize, carried: Option<i64>) -> Result<WalkStatus, ExecutionError> {
        let mut stack = ContinuationStack::new(self.max_branch_depth);
        let mut cursor = Continuation {
            sequence: MAIN_SEQUENCE,
            position: start,
        };
        let mut ended = false;

        if let Some(previous) = start.checked_sub(1) {
            if let Some(&index) = self.plan.main().get(previous) {
                self.route(index, carried, &mut cursor, &mut stack, &mut ended)?;
            }
        }

        loop {
            let next = self.plan.sequence(cursor.sequence).get(cursor.position).copied();
            let Some(index) = next else {
                match stack.pop() {
                    Some(resume) => {
                        cursor = resume;
                        continue;
                    }
                    None => break,
                }
            };
            cursor.position += 1;

            let (result, return_value) = self.call(index, Phase::Event);
            if let Err(e) = result {
                match e.kind() {
                    FailureKind::Recoverable => {
                        self.report(index, Phase::Event, &e);
                        return Ok(WalkStatus::Abandoned);
                    }
                    FailureKind::EndOfData => self.end_of_data(index),
                    FailureKind::Fatal => return Err(self.fatal(index, Phase::Event, &e)),
                }
            }
            self.route(index, return_value, &mut cursor, &mut stack, &mut ended)?;
        }

        Ok(if ended {
            WalkStatus::Ended
        } else {
            WalkStatus::Completed
        })
    }

    fn route(
        &self,
        index: ModuleIndex,
        return_value: Option<i64>,
        cursor: &mut Continuation,
        stack: &mut ContinuationStack,
        ended: &mut bool,
    ) -> Result<(), ExecutionError> {
        let module = self.plan.module(index);
        let Some(condition) = ConditionEvaluator::select(&module.conditions, return_value) else {
            return Ok(());
        };
        ConditionTaken {
            module: module.instance.name(),
            return_value: return_value.unwrap_or_default(),
            expression: &condition.expression,
            after: condition.after,
        }
        .log();

        match condition.after {
            AfterConditionPath::Continue => stack
                .push(*cursor)
                .map_err(|e| ExecutionError::Configuration(e.to_string()))?,
            AfterConditionPath::End => {
                stack.clear();
                *ended = true;
            }
        }
        *cursor = Continuation {
            sequence: condition.branch,
            position: 0,
        };
        Ok(())
    }

    /// Serialized form of the current event.
    pub fn snapshot(&self) -> Result<Vec<u8>, ExecutionError> {
        self.store
            .snapshot_event()
            .and_then(|snapshot| snapshot.to_bytes())
            .map_err(|e| RingBufferError::Payload(e.to_string()).into())
    }

    /// Loads an event received from another context; call after
    /// [`begin_event`](Self::begin_event).
    pub fn restore(&mut self, snapshot: EventSnapshot) -> Result<(), ExecutionError> {
        self.store
            .restore_event(snapshot)
            .map_err(|e| RingBufferError::Payload(e.to_string()).into())
    }
}
