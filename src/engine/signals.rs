// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Drain and forced-shutdown signalling shared by every execution context.
//!
//! ```text
//! interrupt #1 ──▶ drain   (no new events, finish what is in flight)
//! interrupt #2 ──▶ force   (within the grace period: abort, swallow terminate errors)
//! fatal error  ──▶ abort   (peers stop blocking on ring buffers)
//! ```

use crate::observability::messages::{
    engine::{DrainRequested, ForcedShutdownRequested},
    StructuredLog,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    Drain,
    Force,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignals {
    drain: CancellationToken,
    force: CancellationToken,
    abort: CancellationToken,
    first_interrupt: Arc<Mutex<Option<Instant>>>,
    grace: Duration,
}

impl ShutdownSignals {
    pub fn new(grace: Duration) -> Self {
        let force = CancellationToken::new();
        Self {
            drain: CancellationToken::new(),
            abort: force.child_token(),
            force,
            first_interrupt: Arc::new(Mutex::new(None)),
            grace,
        }
    }

    /// Handles one user interrupt. A repeat within the grace period forces the
    /// shutdown; a later one starts a new grace period.
    pub fn interrupt(&self) -> InterruptOutcome {
        let now = Instant::now();
        let mut first = self.first_interrupt.lock();
        match *first {
            Some(at) if now.duration_since(at) <= self.grace => {
                ForcedShutdownRequested { grace: self.grace }.log();
                self.force.cancel();
                InterruptOutcome::Force
            }
            _ => {
                *first = Some(now);
                self.request_drain("interrupt");
                InterruptOutcome::Drain
            }
        }
    }

    pub fn request_drain(&self, reason: &str) {
        if !self.drain.is_cancelled() {
            DrainRequested { reason }.log();
            self.drain.cancel();
        }
    }

    pub fn is_draining(&self) -> bool {
        self.drain.is_cancelled()
    }

    pub fn is_forced(&self) -> bool {
        self.force.is_cancelled()
    }

    /// Makes every blocked ring-buffer operation give up.
    pub fn abort(&self) {
        self.abort.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }

    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Whether a context should stop starting new events.
    pub fn should_stop(&self) -> bool {
        self.is_draining() || self.is_aborted()
    }

    /// Forwards Ctrl-C to [`interrupt`](Self::interrupt) until the shutdown is forced.
    pub fn spawn_listener(&self) -> tokio::task::JoinHandle<()> {
        let signals = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if signals.interrupt() == InterruptOutcome::Force {
                    break;
                }
            }
        })
    }
}
