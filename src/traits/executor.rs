// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{ExecutionSummary, ShutdownSignals};
use crate::errors::ExecutionError;
use crate::path::Path;
use async_trait::async_trait;

#[async_trait]
pub trait EventExecutor: Send + Sync {
    /// Runs a complete job over `path`: initialize, the event loop until end of
    /// data, the event limit or a drain request, then endRun and terminate.
    ///
    /// Returns a Result containing either:
    /// - Ok(ExecutionSummary): event counts and per-module statistics
    /// - Err(ExecutionError): the first error that ended the job
    async fn process(&self, path: Path) -> Result<ExecutionSummary, ExecutionError>;

    /// "single" or "parallel"
    fn mode(&self) -> &'static str;

    /// Drain and forced-shutdown signals of this executor.
    fn signals(&self) -> &ShutdownSignals;
}
