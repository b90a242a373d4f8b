// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Paths
//!
//! A path is an ordered sequence of module instances and nested paths. Nested
//! paths are spliced in place; conditional sub-paths hang off the module that owns
//! the condition. A path is a tree of owned values: building one consumes the
//! instances and sub-paths added to it.

use crate::errors::{PathError, RegistryError};
use crate::module::{AfterConditionPath, ModuleInstance};
use crate::registry::ModuleRegistry;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug)]
pub enum PathElement {
    Module(ModuleInstance),
    Path(Path),
}

#[derive(Default)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a flat path from modules in order.
    pub fn from_modules(modules: impl IntoIterator<Item = ModuleInstance>) -> Self {
        Self {
            elements: modules.into_iter().map(PathElement::Module).collect(),
        }
    }

    pub fn add_module(&mut self, module: ModuleInstance) {
        self.elements.push(PathElement::Module(module));
    }

    pub fn add_path(&mut self, path: Path) {
        self.elements.push(PathElement::Path(path));
    }

    /// Attaches a condition to the last module added to this path, looking into
    /// trailing nested paths.
    pub fn add_condition(
        &mut self,
        expression: &str,
        path: Path,
        after: AfterConditionPath,
    ) -> Result<(), PathError> {
        let module = self.last_module_mut().ok_or(PathError::NoPrecedingModule)?;
        module.if_value(expression, path, after)
    }

    fn last_module_mut(&mut self) -> Option<&mut ModuleInstance> {
        self.elements.iter_mut().rev().find_map(|element| match element {
            PathElement::Module(module) => Some(module),
            PathElement::Path(path) => path.last_module_mut(),
        })
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// The modules executed in order when no condition fires.
    pub fn flatten(&self) -> Vec<&ModuleInstance> {
        let mut modules = Vec::new();
        for element in &self.elements {
            match element {
                PathElement::Module(module) => modules.push(module),
                PathElement::Path(path) => modules.extend(path.flatten()),
            }
        }
        modules
    }

    /// Every module, including those in conditional sub-paths.
    pub fn all_modules(&self) -> Vec<&ModuleInstance> {
        let mut modules = Vec::new();
        for module in self.flatten() {
            modules.push(module);
            for condition in module.conditions() {
                modules.extend(condition.path.all_modules());
            }
        }
        modules
    }

    pub fn module_names(&self) -> Vec<String> {
        self.flatten().iter().map(|m| m.name().to_string()).collect()
    }

    /// Number of modules on the unconditional route.
    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many conditional sub-paths nest inside each other.
    pub fn branch_depth(&self) -> usize {
        self.flatten()
            .iter()
            .flat_map(|m| m.conditions())
            .map(|c| 1 + c.path.branch_depth())
            .max()
            .unwrap_or(0)
    }

    /// Checks what has to hold before any module runs: branch nesting within
    /// `max_branch_depth` and no instance name used twice, since statistics are
    /// kept per name.
    pub fn check(&self, max_branch_depth: usize) -> Result<(), PathError> {
        let depth = self.branch_depth();
        if depth > max_branch_depth {
            return Err(PathError::BranchTooDeep {
                depth,
                max: max_branch_depth,
            });
        }

        let mut seen = HashSet::new();
        for module in self.all_modules() {
            if !seen.insert(module.name()) {
                return Err(PathError::DuplicateModuleName {
                    name: module.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Flattened modules, owned.
    pub fn into_modules(self) -> Vec<ModuleInstance> {
        let mut modules = Vec::new();
        for element in self.elements {
            match element {
                PathElement::Module(module) => modules.push(module),
                PathElement::Path(path) => modules.extend(path.into_modules()),
            }
        }
        modules
    }

    /// Deep copy for another execution context.
    pub fn replicate(&self, registry: &ModuleRegistry) -> Result<Path, RegistryError> {
        let elements = self
            .elements
            .iter()
            .map(|element| match element {
                PathElement::Module(module) => module.replicate(registry).map(PathElement::Module),
                PathElement::Path(path) => path.replicate(registry).map(PathElement::Path),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Path { elements })
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.elements.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::test_registry;

    fn module(registry: &ModuleRegistry, name: &str) -> ModuleInstance {
        registry.create("Transform").unwrap().with_name(name)
    }

    #[test]
    fn test_nested_paths_are_spliced() {
        let registry = test_registry();
        let mut inner = Path::new();
        inner.add_module(module(&registry, "b"));
        inner.add_module(module(&registry, "c"));

        let mut path = Path::new();
        path.add_module(module(&registry, "a"));
        path.add_path(inner);
        path.add_module(module(&registry, "d"));

        assert_eq!(path.module_names(), vec!["a", "b", "c", "d"]);
        assert_eq!(path.len(), 4);
        assert_eq!(path.into_modules().len(), 4);
    }

    #[test]
    fn test_condition_attaches_to_last_module() {
        let registry = test_registry();
        let mut inner = Path::new();
        inner.add_module(module(&registry, "b"));

        let mut path = Path::new();
        path.add_module(module(&registry, "a"));
        path.add_path(inner);

        let mut branch = Path::new();
        branch.add_module(module(&registry, "x"));
        path.add_condition("< 1", branch, AfterConditionPath::End)
            .unwrap();

        let flat = path.flatten();
        assert!(flat[0].conditions().is_empty());
        assert_eq!(flat[1].conditions().len(), 1);
        assert_eq!(path.branch_depth(), 1);
        assert_eq!(path.all_modules().len(), 3);
    }

    #[test]
    fn test_check_rejects_deep_branches_and_duplicate_names() {
        let registry = test_registry();
        let mut branch = Path::new();
        branch.add_module(module(&registry, "x"));
        let mut path = Path::new();
        path.add_module(module(&registry, "a"));
        path.add_condition("== 0", branch, AfterConditionPath::Continue)
            .unwrap();

        assert_eq!(path.check(1), Ok(()));
        assert_eq!(
            path.check(0),
            Err(PathError::BranchTooDeep { depth: 1, max: 0 })
        );

        let mut branch = Path::new();
        branch.add_module(module(&registry, "a"));
        let mut path = Path::new();
        path.add_module(module(&registry, "a"));
        path.add_condition("1", branch, AfterConditionPath::End)
            .unwrap();
        assert_eq!(
            path.check(4),
            Err(PathError::DuplicateModuleName {
                name: "a".to_string()
            })
        );
    }

    #[test]
    fn test_condition_without_module_is_rejected() {
        let mut path = Path::new();
        assert_eq!(
            path.add_condition("1", Path::new(), AfterConditionPath::End),
            Err(PathError::NoPrecedingModule)
        );
    }

    #[test]
    fn test_replicate_preserves_structure() {
        let registry = test_registry();
        let mut branch = Path::new();
        branch.add_module(module(&registry, "x"));

        let mut path = Path::new();
        path.add_module(module(&registry, "a"));
        path.add_condition(">= 2", branch, AfterConditionPath::Continue)
            .unwrap();

        let copy = path.replicate(&registry).unwrap();
        assert_eq!(copy.module_names(), path.module_names());
        assert_eq!(copy.branch_depth(), 1);
        assert_eq!(
            copy.flatten()[0].conditions()[0].after,
            AfterConditionPath::Continue
        );
    }
}
