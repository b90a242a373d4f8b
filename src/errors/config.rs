// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur while validating a steering configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The top-level path has no elements
    EmptyPath,
    /// A condition points at a branch path without modules
    EmptyConditionPath {
        /// The module owning the condition
        module: String,
        /// The condition expression as written in the steering file
        expression: String,
    },
    /// No provider is registered for the requested module type
    UnknownModuleType {
        /// The unresolved type name
        module_type: String,
    },
    /// Two modules share the same instance name
    DuplicateModuleName {
        /// The duplicated instance name
        name: String,
    },
    /// A parameter is not declared by the module type
    UnknownParameter {
        /// The module instance name
        module: String,
        /// The parameter that could not be found
        parameter: String,
    },
    /// A parameter value does not match the declared parameter type
    InvalidParameter {
        /// The module instance name
        module: String,
        /// The offending parameter
        parameter: String,
        /// Why the value was rejected
        reason: String,
    },
    /// A parameter without default was never assigned
    MissingParameter {
        /// The module instance name
        module: String,
        /// The parameter that must be set
        parameter: String,
    },
    /// A condition expression could not be parsed
    InvalidCondition {
        /// The module owning the condition
        module: String,
        /// The expression as written in the steering file
        expression: String,
        /// Why the expression was rejected
        reason: String,
    },
    /// Conditional branches nest deeper than the configured maximum
    BranchDepthExceeded {
        /// The nesting depth found in the path
        depth: usize,
        /// The configured maximum
        max: usize,
    },
    /// An executor option has an unusable value
    InvalidOption {
        /// The option name
        option: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyPath => write!(f, "The path does not contain any modules"),
            ValidationError::EmptyConditionPath { module, expression } => {
                write!(
                    f,
                    "Condition '{}' of module '{}' points at an empty path",
                    expression, module
                )
            }
            ValidationError::UnknownModuleType { module_type } => {
                write!(f, "Unknown module type: '{}'", module_type)
            }
            ValidationError::DuplicateModuleName { name } => {
                write!(f, "Duplicate module name: '{}'", name)
            }
            ValidationError::UnknownParameter { module, parameter } => {
                write!(
                    f,
                    "Module '{}' has no parameter named '{}'",
                    module, parameter
                )
            }
            ValidationError::InvalidParameter {
                module,
                parameter,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value for parameter '{}' of module '{}': {}",
                    parameter, module, reason
                )
            }
            ValidationError::MissingParameter { module, parameter } => {
                write!(
                    f,
                    "Module '{}' requires parameter '{}' to be set",
                    module, parameter
                )
            }
            ValidationError::InvalidCondition {
                module,
                expression,
                reason,
            } => {
                write!(
                    f,
                    "Invalid condition '{}' on module '{}': {}",
                    expression, module, reason
                )
            }
            ValidationError::BranchDepthExceeded { depth, max } => {
                write!(
                    f,
                    "Conditional branches reach depth {}, the maximum is {}",
                    depth, max
                )
            }
            ValidationError::InvalidOption { option, reason } => {
                write!(f, "Invalid executor option '{}': {}", option, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
