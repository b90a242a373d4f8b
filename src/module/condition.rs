// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Conditions route an event into a sub-path based on a module's return value.
//!
//! An expression is an operator followed by an integer, e.g. `<= 3`. A bare
//! integer means equality. `true` and `false` test a boolean return value and
//! stand for `>= 1` and `< 1`. The first matching condition of a module wins.

use crate::errors::PathError;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ConditionOperator {
    // Longer tokens first so that "<=" is not read as "<".
    const TOKENS: [(&'static str, ConditionOperator); 8] = [
        ("==", ConditionOperator::Eq),
        ("!=", ConditionOperator::Ne),
        ("<=", ConditionOperator::Le),
        (">=", ConditionOperator::Ge),
        ("≤", ConditionOperator::Le),
        ("≥", ConditionOperator::Ge),
        ("<", ConditionOperator::Lt),
        (">", ConditionOperator::Gt),
    ];

    pub fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            ConditionOperator::Eq => lhs == rhs,
            ConditionOperator::Ne => lhs != rhs,
            ConditionOperator::Lt => lhs < rhs,
            ConditionOperator::Le => lhs <= rhs,
            ConditionOperator::Gt => lhs > rhs,
            ConditionOperator::Ge => lhs >= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ConditionOperator::Eq => "==",
            ConditionOperator::Ne => "!=",
            ConditionOperator::Lt => "<",
            ConditionOperator::Le => "<=",
            ConditionOperator::Gt => ">",
            ConditionOperator::Ge => ">=",
        }
    }
}

/// A parsed `<operator> <integer>` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionExpression {
    pub operator: ConditionOperator,
    pub value: i64,
}

impl ConditionExpression {
    pub fn new(operator: ConditionOperator, value: i64) -> Self {
        Self { operator, value }
    }

    /// Matches a module that returned `true`.
    pub fn when_true() -> Self {
        Self::new(ConditionOperator::Ge, 1)
    }

    /// Matches a module that returned `false`.
    pub fn when_false() -> Self {
        Self::new(ConditionOperator::Lt, 1)
    }

    pub fn matches(&self, return_value: i64) -> bool {
        self.operator.apply(return_value, self.value)
    }
}

impl FromStr for ConditionExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PathError::InvalidCondition {
            expression: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        match trimmed {
            "" => return Err(invalid("empty expression")),
            "true" => return Ok(Self::when_true()),
            "false" => return Ok(Self::when_false()),
            _ => {}
        }

        let (operator, rest) = ConditionOperator::TOKENS
            .iter()
            .find_map(|(token, op)| trimmed.strip_prefix(token).map(|rest| (*op, rest)))
            .unwrap_or((ConditionOperator::Eq, trimmed));

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(invalid("missing integer operand"));
        }
        let value = rest.parse::<i64>().map_err(|_| {
            if rest.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
                invalid("operand is not an integer")
            } else {
                invalid("unknown operator")
            }
        })?;

        Ok(Self { operator, value })
    }
}

impl fmt::Display for ConditionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator.symbol(), self.value)
    }
}

/// What happens once a conditional sub-path has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterConditionPath {
    /// The event ends with the sub-path
    #[default]
    End,
    /// Resume the parent path after the module that owns the condition
    Continue,
}

impl fmt::Display for AfterConditionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AfterConditionPath::End => write!(f, "end"),
            AfterConditionPath::Continue => write!(f, "continue"),
        }
    }
}

/// A condition attached to a module instance.
#[derive(Debug)]
pub struct ModuleCondition {
    pub expression: ConditionExpression,
    pub path: Path,
    pub after: AfterConditionPath,
}

impl ModuleCondition {
    pub fn new(expression: ConditionExpression, path: Path, after: AfterConditionPath) -> Self {
        Self {
            expression,
            path,
            after,
        }
    }
}
