// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Execution Engine
//!
//! Two executors run a [`Path`](crate::path::Path) over the events produced by
//! its master module:
//!
//! * [`ProcessController`] - everything in one execution context
//! * [`ParallelExecutor`] - input, N workers and output connected by ring buffers
//!
//! Both drive the same [`ProcessContext`](context::ProcessContext), which walks a
//! compiled [`ExecutionPlan`] and follows conditional branches through the
//! [`ConditionEvaluator`]. [`ExecutorFactory`] picks the executor from the
//! steering configuration.

pub mod condition;
pub mod context;
pub mod controller;
pub mod factory;
pub mod parallel;
pub mod plan;
pub mod signals;
pub mod stats;

pub use condition::ConditionEvaluator;
pub use controller::{ProcessController, RunOptions};
pub use factory::ExecutorFactory;
pub use parallel::{ParallelExecutor, ParallelOptions};
pub use plan::ExecutionPlan;
pub use signals::ShutdownSignals;
pub use stats::{EventCounters, ExecutionSummary, ModuleStatistics, Statistics};
