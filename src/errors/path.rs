// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while assembling paths and their conditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("invalid condition expression '{expression}': {reason}")]
    InvalidCondition { expression: String, reason: String },

    #[error("the path has no module to attach a condition to")]
    NoPrecedingModule,

    #[error("conditional branches reach depth {depth}, the maximum is {max}")]
    BranchTooDeep { depth: usize, max: usize },

    #[error("module name '{name}' is used more than once in the path")]
    DuplicateModuleName { name: String },
}
