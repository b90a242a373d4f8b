// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The three kinds of execution context of a parallel job.
//!
//! Every stage owns one [`ProcessContext`] and runs on a blocking thread. A stage
//! never returns early without running its shutdown, and a stage that fails
//! aborts its peers so nobody stays blocked on a ring buffer.

use crate::datastore::{EventSnapshot, RunKey};
use crate::engine::context::{MasterOutcome, ProcessContext, WalkStatus};
use crate::engine::controller::RunOptions;
use crate::engine::parallel::is_consequence;
use crate::engine::parallel::reorder::ReorderBuffer;
use crate::engine::parallel::ring_buffer::{
    Frame, RingConsumer, RingProducer, WindowAcquirer, WindowReleaser,
};
use crate::engine::plan::ExecutionPlan;
use crate::engine::signals::ShutdownSignals;
use crate::engine::stats::{EventCounters, Statistics};
use crate::errors::{ExecutionError, RingBufferError};
use crate::module::ProcessRole;
use crate::observability::messages::{engine::EventLimitReached, StructuredLog};
use crate::path::Path;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::task::JoinHandle;

/// What a finished stage hands back to the executor.
#[derive(Debug)]
pub struct StageOutcome {
    pub role: ProcessRole,
    pub statistics: Statistics,
    pub counters: EventCounters,
    pub error: Option<ExecutionError>,
}

impl StageOutcome {
    fn finished(ctx: &ProcessContext, result: Result<(), ExecutionError>) -> Self {
        Self {
            role: ctx.role(),
            statistics: ctx.statistics().clone(),
            counters: ctx.counters,
            error: result.err(),
        }
    }

    pub fn crashed(role: ProcessRole, reason: String) -> Self {
        Self {
            role,
            statistics: Statistics::default(),
            counters: EventCounters::default(),
            error: Some(ExecutionError::ContextCrashed {
                context: role.to_string(),
                reason,
            }),
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

/// Runs `stage` on the blocking pool. A panic inside the stage aborts the peers
/// and comes back as a crashed outcome for `role`.
pub fn spawn<F>(role: ProcessRole, signals: &ShutdownSignals, stage: F) -> JoinHandle<StageOutcome>
where
    F: FnOnce(&ShutdownSignals) -> StageOutcome + Send + 'static,
{
    let signals = signals.clone();
    tokio::task::spawn_blocking(move || {
        match catch_unwind(AssertUnwindSafe(|| stage(&signals))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                signals.abort();
                StageOutcome::crashed(role, panic_reason(payload.as_ref()))
            }
        }
    })
}

fn payload_error(error: impl ToString) -> ExecutionError {
    RingBufferError::Payload(error.to_string()).into()
}

/// The frame that tells downstream contexts about `error`. A relayed crash keeps
/// the context it came from; an error caused by an abort sends nothing.
fn error_frame(role: ProcessRole, error: &ExecutionError) -> Option<Frame> {
    match error {
        ExecutionError::ContextCrashed { context, reason } => {
            Some(Frame::error(&format!("{}: {}", context, reason)))
        }
        e if is_consequence(e) => None,
        e => Some(Frame::error(&format!("{}: {}", role, e))),
    }
}

/// Error reported by a context that received an error frame.
fn peer_crash(frame: &Frame) -> ExecutionError {
    let message = frame.error_message();
    let (context, reason) = message.split_once(": ").unwrap_or(("worker", &message));
    ExecutionError::ContextCrashed {
        context: context.to_string(),
        reason: reason.to_string(),
    }
}

/// Queues the error frame for `error`, then aborts the peers. The frame goes
/// first so the consumer still receives it after the abort.
fn report_failure(
    role: ProcessRole,
    error: &ExecutionError,
    signals: &ShutdownSignals,
    output: &RingProducer,
) {
    if let Some(frame) = error_frame(role, error) {
        let _ = output.try_push(&frame);
    }
    signals.abort();
}

/// Shuts the context down and combines the result with the loop's result; the
/// loop's error wins.
fn close(
    ctx: &mut ProcessContext,
    signals: &ShutdownSignals,
    result: Result<(), ExecutionError>,
) -> Result<(), ExecutionError> {
    let shutdown = ctx.shutdown(signals.is_forced());
    let result = result.and(shutdown);
    if result.is_err() {
        signals.abort();
    }
    result
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

pub fn run_input(
    path: Path,
    options: RunOptions,
    signals: &ShutdownSignals,
    output: RingProducer,
    window: WindowAcquirer,
) -> StageOutcome {
    let mut ctx = ProcessContext::new(
        ProcessRole::Input,
        ExecutionPlan::compile(path),
        options.max_branch_depth,
    );
    let span = ctx.span();
    let _entered = span.enter();

    let result = ctx
        .initialize()
        .and_then(|()| input_loop(&mut ctx, options, signals, &output, &window));
    if let Err(e) = &result {
        report_failure(ctx.role(), e, signals, &output);
    }
    drop(output);

    let result = close(&mut ctx, signals, result);
    StageOutcome::finished(&ctx, result)
}

fn input_loop(
    ctx: &mut ProcessContext,
    options: RunOptions,
    signals: &ShutdownSignals,
    output: &RingProducer,
    window: &WindowAcquirer,
) -> Result<(), ExecutionError> {
    let master = ctx.master_index()?;
    let mut sequence = 0u64;
    let mut last_run: Option<RunKey> = None;

    loop {
        if signals.should_stop() || ctx.stop_requested() {
            break;
        }
        if let Some(limit) = options.max_events {
            if ctx.counters.produced >= limit {
                EventLimitReached {
                    role: ctx.role(),
                    limit,
                }
                .log();
                break;
            }
        }

        let frame = match ctx.next_event(master)? {
            MasterOutcome::EndOfData => {
                ctx.finish_event();
                break;
            }
            MasterOutcome::Skipped => {
                ctx.counters.skipped += 1;
                sequence += 1;
                Frame::skipped(sequence)
            }
            MasterOutcome::Event(meta, return_value) => {
                let key = meta.run_key();
                ctx.begin_run(key)?;
                sequence += 1;
                match ctx.walk(1, return_value)? {
                    WalkStatus::Abandoned => {
                        ctx.counters.skipped += 1;
                        Frame::skipped(sequence)
                    }
                    WalkStatus::Ended => {
                        ctx.counters.processed += 1;
                        Frame::ended(sequence)
                    }
                    WalkStatus::Completed => {
                        ctx.counters.processed += 1;
                        let run_changed = last_run.is_some_and(|run| run != key);
                        last_run = Some(key);
                        Frame::event(sequence, ctx.snapshot()?, run_changed)
                    }
                }
            }
        };

        ctx.finish_event();
        window.acquire()?;
        output.push(&frame)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

pub fn run_worker(
    index: usize,
    path: Path,
    options: RunOptions,
    signals: &ShutdownSignals,
    input: RingConsumer,
    output: RingProducer,
) -> StageOutcome {
    let mut ctx = ProcessContext::new(
        ProcessRole::Worker(index),
        ExecutionPlan::compile(path),
        options.max_branch_depth,
    );
    let span = ctx.span();
    let _entered = span.enter();

    let result = ctx
        .initialize()
        .and_then(|()| worker_loop(&mut ctx, signals, &input, &output));
    drop(input);

    let result = match result {
        Ok(()) => close(&mut ctx, signals, Ok(())).and_then(|()| {
            output
                .push(&Frame::end_of_stream())
                .map_err(ExecutionError::from)
        }),
        Err(e) => {
            report_failure(ctx.role(), &e, signals, &output);
            close(&mut ctx, signals, Err(e))
        }
    };
    if result.is_err() {
        signals.abort();
    }
    StageOutcome::finished(&ctx, result)
}

fn worker_loop(
    ctx: &mut ProcessContext,
    signals: &ShutdownSignals,
    input: &RingConsumer,
    output: &RingProducer,
) -> Result<(), ExecutionError> {
    while let Some(frame) = input.pop()? {
        if frame.is_error() {
            return Err(peer_crash(&frame));
        }
        if frame.is_skipped() || frame.is_ended() {
            output.push(&frame)?;
            continue;
        }

        let snapshot = EventSnapshot::from_bytes(&frame.payload).map_err(payload_error)?;
        let key = snapshot.metadata.as_ref().map(|meta| meta.run_key());
        ctx.begin_event();
        ctx.restore(snapshot)?;
        if let Some(key) = key {
            ctx.begin_run(key)?;
        }

        let reply = match ctx.walk(0, None)? {
            WalkStatus::Completed => {
                ctx.counters.processed += 1;
                Frame::event(frame.sequence, ctx.snapshot()?, frame.is_run_change())
            }
            WalkStatus::Ended => {
                ctx.counters.processed += 1;
                Frame::ended(frame.sequence)
            }
            WalkStatus::Abandoned => {
                ctx.counters.skipped += 1;
                Frame::skipped(frame.sequence)
            }
        };
        ctx.finish_event();
        output.push(&reply)?;

        if ctx.stop_requested() {
            signals.request_drain("end of data");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub fn run_output(
    path: Path,
    options: RunOptions,
    signals: &ShutdownSignals,
    workers: usize,
    input: RingConsumer,
    window: WindowReleaser,
    window_size: usize,
) -> StageOutcome {
    let mut ctx = ProcessContext::new(
        ProcessRole::Output,
        ExecutionPlan::compile(path),
        options.max_branch_depth,
    );
    let span = ctx.span();
    let _entered = span.enter();

    let result = ctx.initialize().and_then(|()| {
        let mut reorder = ReorderBuffer::new(window_size);
        output_loop(&mut ctx, signals, workers, &input, &window, &mut reorder)
    });
    if result.is_err() {
        signals.abort();
    }
    drop(input);

    let result = close(&mut ctx, signals, result);
    StageOutcome::finished(&ctx, result)
}

fn output_loop(
    ctx: &mut ProcessContext,
    signals: &ShutdownSignals,
    workers: usize,
    input: &RingConsumer,
    window: &WindowReleaser,
    reorder: &mut ReorderBuffer,
) -> Result<(), ExecutionError> {
    let mut finished = 0;
    while finished < workers {
        let Some(frame) = input.pop()? else {
            break;
        };
        if frame.is_error() {
            return Err(peer_crash(&frame));
        }
        if frame.is_end_of_stream() {
            finished += 1;
            continue;
        }

        reorder.insert(frame)?;
        while let Some(ready) = reorder.pop_ready() {
            window.release();
            consume(ctx, ready)?;
            if ctx.stop_requested() {
                signals.request_drain("end of data");
            }
        }
    }

    let remaining = reorder.drain_remaining();
    if !remaining.is_empty() {
        return Err(RingBufferError::Reorder(format!(
            "{} events never completed, sequence {} is missing",
            remaining.len(),
            reorder.next_sequence()
        ))
        .into());
    }
    Ok(())
}

fn consume(ctx: &mut ProcessContext, frame: Frame) -> Result<(), ExecutionError> {
    if frame.is_skipped() {
        ctx.counters.skipped += 1;
        return Ok(());
    }
    if frame.is_ended() {
        ctx.counters.processed += 1;
        return Ok(());
    }

    if frame.is_run_change() {
        ctx.end_runs()?;
    }
    let snapshot = EventSnapshot::from_bytes(&frame.payload).map_err(payload_error)?;
    let key = snapshot.metadata.as_ref().map(|meta| meta.run_key());
    ctx.begin_event();
    ctx.restore(snapshot)?;
    if let Some(key) = key {
        ctx.begin_run(key)?;
    }

    match ctx.walk(0, None)? {
        WalkStatus::Completed | WalkStatus::Ended => ctx.counters.processed += 1,
        WalkStatus::Abandoned => ctx.counters.skipped += 1,
    }
    ctx.finish_event();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::journaled_registry;
    use crate::engine::parallel::ring_buffer::{InFlightWindow, RingBuffer};
    use crate::module::Phase;
    use std::time::Duration;

    const POLL: Duration = Duration::from_millis(5);

    #[test]
    fn test_failing_worker_sends_error_frame_before_abort() {
        let (registry, journal) = journaled_registry();
        let mut fatal = registry.create("Fatal").unwrap();
        fatal.set_param("phase", "initialize".to_string()).unwrap();

        let signals = ShutdownSignals::new(Duration::from_secs(1));
        let (_in_tx, in_rx) = RingBuffer::bounded("RB_in", 4, POLL, signals.abort_token());
        let (out_tx, out_rx) = RingBuffer::bounded("RB_out", 4, POLL, signals.abort_token());

        let outcome = run_worker(
            2,
            Path::from_modules([fatal]),
            RunOptions::default(),
            &signals,
            in_rx,
            out_tx,
        );
        assert!(matches!(outcome.error, Some(ExecutionError::FatalModule { .. })));
        assert!(signals.is_aborted());

        let frame = out_rx.pop().unwrap().unwrap();
        assert!(frame.is_error());
        assert!(frame.error_message().starts_with("worker-2: "), "{}", frame.error_message());
        assert_eq!(journal.lock().count("Fatal", Phase::Terminate), 0);
    }

    #[test]
    fn test_output_reports_the_crashed_worker() {
        let (registry, journal) = journaled_registry();
        let signals = ShutdownSignals::new(Duration::from_secs(1));
        let (tx, rx) = RingBuffer::bounded("RB_out", 8, POLL, signals.abort_token());
        let (_acquirer, releaser) = InFlightWindow::new(8, POLL, signals.abort_token());

        tx.push(&Frame::skipped(1)).unwrap();
        tx.push(&Frame::error("worker-2: module 'Fatal' failed")).unwrap();
        signals.abort();

        let outcome = run_output(
            Path::from_modules([registry.create("Writer").unwrap()]),
            RunOptions::default(),
            &signals,
            2,
            rx,
            releaser,
            8,
        );
        match outcome.error {
            Some(ExecutionError::ContextCrashed { context, reason }) => {
                assert_eq!(context, "worker-2");
                assert_eq!(reason, "module 'Fatal' failed");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(journal.lock().count("Writer", Phase::Terminate), 1);
    }

    #[test]
    fn test_error_frames_for_consequences_are_not_sent() {
        let aborted: ExecutionError = RingBufferError::Aborted("RB_in").into();
        assert_eq!(error_frame(ProcessRole::Worker(1), &aborted), None);

        let relayed = ExecutionError::ContextCrashed {
            context: "input".to_string(),
            reason: "boom".to_string(),
        };
        let frame = error_frame(ProcessRole::Worker(3), &relayed).unwrap();
        assert_eq!(peer_crash(&frame), relayed);
    }
}
