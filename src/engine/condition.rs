// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Condition selection and the continuation stack used to walk branches.

use crate::engine::plan::{CompiledCondition, SequenceId};
use crate::errors::PathError;

pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// First condition, in insertion order, that matches the return value. A
    /// module that set no return value never branches.
    pub fn select(
        conditions: &[CompiledCondition],
        return_value: Option<i64>,
    ) -> Option<&CompiledCondition> {
        let value = return_value?;
        conditions.iter().find(|c| c.expression.matches(value))
    }
}

/// Where to resume once a branch is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub sequence: SequenceId,
    pub position: usize,
}

#[derive(Debug)]
pub struct ContinuationStack {
    frames: Vec<Continuation>,
    max_depth: usize,
}

impl ContinuationStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, continuation: Continuation) -> Result<(), PathError> {
        if self.frames.len() >= self.max_depth {
            return Err(PathError::BranchTooDeep {
                depth: self.frames.len() + 1,
                max: self.max_depth,
            });
        }
        self.frames.push(continuation);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Continuation> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{AfterConditionPath, ConditionExpression};

    fn condition(expression: &str, branch: usize) -> CompiledCondition {
        CompiledCondition {
            expression: expression.parse::<ConditionExpression>().unwrap(),
            branch: SequenceId(branch),
            after: AfterConditionPath::End,
        }
    }

    #[test]
    fn test_first_match_wins() {
        let conditions = vec![condition("< 5", 1), condition("< 10", 2), condition("3", 3)];

        struct TestCase {
            return_value: Option<i64>,
            branch: Option<usize>,
        }

        let cases = vec![
            TestCase {
                return_value: Some(3),
                branch: Some(1),
            },
            TestCase {
                return_value: Some(7),
                branch: Some(2),
            },
            TestCase {
                return_value: Some(12),
                branch: None,
            },
            TestCase {
                return_value: None,
                branch: None,
            },
        ];

        for case in cases {
            let selected = ConditionEvaluator::select(&conditions, case.return_value);
            assert_eq!(
                selected.map(|c| c.branch.0),
                case.branch,
                "return value {:?}",
                case.return_value
            );
        }
    }

    #[test]
    fn test_stack_depth_is_bounded() {
        let mut stack = ContinuationStack::new(2);
        let frame = Continuation {
            sequence: SequenceId(0),
            position: 1,
        };
        stack.push(frame).unwrap();
        stack.push(frame).unwrap();
        assert_eq!(
            stack.push(frame),
            Err(PathError::BranchTooDeep { depth: 3, max: 2 })
        );
        assert_eq!(stack.pop(), Some(frame));
        assert_eq!(stack.depth(), 1);
        stack.clear();
        assert!(stack.is_empty());
    }
}
