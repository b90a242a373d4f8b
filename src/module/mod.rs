// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Modules
//!
//! A module is a user-supplied processing unit with five lifecycle callbacks:
//!
//! ```text
//! initialize ─▶ (beginRun ─▶ event* ─▶ endRun)* ─▶ terminate
//! ```
//!
//! The engine holds each module as a [`ModuleInstance`]: the boxed [`Module`]
//! implementation plus its instance name, its bound [`ParamList`] and the
//! conditions that route events into sub-paths.
//!
//! [`Module`]: crate::traits::Module

pub mod condition;
mod context;
mod instance;
pub mod params;

pub use condition::{AfterConditionPath, ConditionExpression, ConditionOperator, ModuleCondition};
pub use context::ModuleContext;
pub use instance::ModuleInstance;
pub use params::{ParamInfo, ParamKind, ParamList, ParamType, ParamValue};

use std::fmt;

/// Lifecycle phase of a module callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initialize,
    BeginRun,
    Event,
    EndRun,
    Terminate,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Initialize,
        Phase::BeginRun,
        Phase::Event,
        Phase::EndRun,
        Phase::Terminate,
    ];

    pub fn index(self) -> usize {
        match self {
            Phase::Initialize => 0,
            Phase::BeginRun => 1,
            Phase::Event => 2,
            Phase::EndRun => 3,
            Phase::Terminate => 4,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initialize => write!(f, "initialize"),
            Phase::BeginRun => write!(f, "beginRun"),
            Phase::Event => write!(f, "event"),
            Phase::EndRun => write!(f, "endRun"),
            Phase::Terminate => write!(f, "terminate"),
        }
    }
}

/// Static capabilities a module type announces to the engine.
///
/// `parallel_safe` modules may run in several worker contexts at once. `input`
/// and `output` mark modules that must stay in the single input or output context
/// when the path is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleProperties {
    pub parallel_safe: bool,
    pub input: bool,
    pub output: bool,
}

impl ModuleProperties {
    /// Pure event transformation; safe to replicate.
    pub fn transformer() -> Self {
        Self {
            parallel_safe: true,
            ..Self::default()
        }
    }

    pub fn input_module() -> Self {
        Self {
            input: true,
            ..Self::default()
        }
    }

    pub fn output_module() -> Self {
        Self {
            output: true,
            ..Self::default()
        }
    }
}

/// Role of the execution context a module instance runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    /// The whole path in one context
    Single,
    Input,
    Worker(usize),
    Output,
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Single => write!(f, "single"),
            ProcessRole::Input => write!(f, "input"),
            ProcessRole::Worker(index) => write!(f, "worker-{}", index),
            ProcessRole::Output => write!(f, "output"),
        }
    }
}
