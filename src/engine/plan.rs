// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A path compiled into an arena of modules and index sequences.
//!
//! The main path is sequence 0; every conditional branch gets a sequence of its
//! own. Modules never move after compilation, so the walker refers to them by
//! index and keeps its continuation stack as plain `(sequence, position)` pairs.

use crate::module::{AfterConditionPath, ConditionExpression, ModuleInstance, ModuleProperties};
use crate::path::Path;

pub type ModuleIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceId(pub usize);

pub const MAIN_SEQUENCE: SequenceId = SequenceId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledCondition {
    pub expression: ConditionExpression,
    pub branch: SequenceId,
    pub after: AfterConditionPath,
}

#[derive(Debug)]
pub struct PlannedModule {
    pub instance: ModuleInstance,
    pub conditions: Vec<CompiledCondition>,
    pub properties: ModuleProperties,
}

#[derive(Debug)]
pub struct ExecutionPlan {
    modules: Vec<PlannedModule>,
    sequences: Vec<Vec<ModuleIndex>>,
    lifecycle: Vec<ModuleIndex>,
}

impl ExecutionPlan {
    pub fn compile(path: Path) -> Self {
        let mut plan = Self {
            modules: Vec::new(),
            sequences: vec![Vec::new()],
            lifecycle: Vec::new(),
        };
        plan.compile_sequence(path, MAIN_SEQUENCE);
        plan
    }

    fn compile_sequence(&mut self, path: Path, sequence: SequenceId) {
        for mut instance in path.into_modules() {
            let index = self.modules.len();
            let conditions = instance.take_conditions();
            let properties = instance.properties();
            self.modules.push(PlannedModule {
                instance,
                conditions: Vec::with_capacity(conditions.len()),
                properties,
            });
            self.sequences[sequence.0].push(index);
            self.lifecycle.push(index);

            for condition in conditions {
                let branch = SequenceId(self.sequences.len());
                self.sequences.push(Vec::new());
                self.compile_sequence(condition.path, branch);
                self.modules[index].conditions.push(CompiledCondition {
                    expression: condition.expression,
                    branch,
                    after: condition.after,
                });
            }
        }
    }

    pub fn module(&self, index: ModuleIndex) -> &PlannedModule {
        &self.modules[index]
    }

    pub fn module_mut(&mut self, index: ModuleIndex) -> &mut PlannedModule {
        &mut self.modules[index]
    }

    pub fn sequence(&self, id: SequenceId) -> &[ModuleIndex] {
        self.sequences.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn main(&self) -> &[ModuleIndex] {
        self.sequence(MAIN_SEQUENCE)
    }

    /// Every module in initialize order: each module is followed by the modules
    /// of its branches.
    pub fn lifecycle(&self) -> &[ModuleIndex] {
        &self.lifecycle
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Instance names in module index order.
    pub fn names(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|m| m.instance.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::test_registry;

    #[test]
    fn test_branch_modules_follow_their_owner() {
        let registry = test_registry();
        let create = |name: &str| registry.create("Transform").unwrap().with_name(name);

        let mut inner = Path::new();
        inner.add_module(create("c"));
        let mut branch = Path::new();
        branch.add_module(create("b1"));
        branch
            .add_condition("== 0", inner, AfterConditionPath::End)
            .unwrap();

        let mut path = Path::new();
        path.add_module(create("a"));
        path.add_condition("< 3", branch, AfterConditionPath::Continue)
            .unwrap();
        path.add_module(create("d"));

        let plan = ExecutionPlan::compile(path);
        let names = plan.names();
        let lifecycle: Vec<&str> = plan.lifecycle().iter().map(|&i| names[i].as_str()).collect();
        assert_eq!(lifecycle, vec!["a", "b1", "c", "d"]);

        let main: Vec<&str> = plan.main().iter().map(|&i| names[i].as_str()).collect();
        assert_eq!(main, vec!["a", "d"]);

        let owner = plan.module(plan.main()[0]);
        assert_eq!(owner.conditions.len(), 1);
        let branch_sequence = plan.sequence(owner.conditions[0].branch);
        assert_eq!(branch_sequence.len(), 1);
        assert_eq!(plan.module(branch_sequence[0]).conditions.len(), 1);
    }
}
