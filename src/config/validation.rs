// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Steering file validation against the module registry.
//!
//! Validation walks the whole path tree once, including nested paths and
//! conditional sub-paths, and collects every problem it finds instead of stopping
//! at the first one. A configuration that passes builds into a [`Path`] without
//! configuration errors.
//!
//! # Checks
//!
//! 1. **Structure**: the path and every conditional sub-path contain modules,
//!    branches stay within `max_branch_depth`
//! 2. **Modules**: every type is registered and every instance name is unique
//! 3. **Parameters**: every assigned parameter is declared and has the declared
//!    type, every parameter without default is assigned
//! 4. **Conditions**: every expression parses
//! 5. **Options**: executor options are usable
//!
//! # Example
//! ```rust
//! use the_pathway::config::{validate_config, Config};
//! use the_pathway::registry::ModuleRegistry;
//!
//! let config: Config = serde_yaml::from_str(
//!     "path:\n  - module: EventInfoSetter\n  - module: EventCounter\n",
//! )
//! .unwrap();
//!
//! let registry = ModuleRegistry::with_builtin_modules();
//! assert!(validate_config(&config, &registry).is_ok());
//! ```
//!
//! [`Path`]: crate::path::Path

use crate::config::consts::MAX_PROCESSES;
use crate::config::{Config, ModuleConfig, PathElementConfig};
use crate::errors::{PathError, ValidationError};
use crate::module::{ConditionExpression, ParamValue};
use crate::observability::messages::{
    validation::{ValidationCompleted, ValidationIssue},
    StructuredLog,
};
use crate::registry::ModuleRegistry;
use std::collections::HashSet;

/// Validates `config` against the module types of `registry`.
///
/// # Returns
/// * `Ok(())` - The configuration builds into a runnable path
/// * `Err(Vec<ValidationError>)` - Every problem found, in path order
pub fn validate_config(
    config: &Config,
    registry: &ModuleRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut validator = Validator {
        registry,
        max_depth: config.max_branch_depth,
        names: HashSet::new(),
        modules: 0,
        errors: Vec::new(),
    };

    validator.check_options(config);
    if count_modules(&config.path) == 0 {
        validator.errors.push(ValidationError::EmptyPath);
    }
    validator.check_path(&config.path, 0);

    for error in &validator.errors {
        ValidationIssue { error }.log();
    }
    ValidationCompleted {
        modules: validator.modules,
        errors: validator.errors.len(),
    }
    .log();

    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(validator.errors)
    }
}

struct Validator<'a> {
    registry: &'a ModuleRegistry,
    max_depth: usize,
    names: HashSet<String>,
    modules: usize,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn check_options(&mut self, config: &Config) {
        if config.processes > MAX_PROCESSES {
            self.errors.push(ValidationError::InvalidOption {
                option: "processes".to_string(),
                reason: format!("at most {} worker processes are supported", MAX_PROCESSES),
            });
        }

        let options = &config.executor_options;
        let zeroes = [
            ("window_factor", options.window_factor.map(|v| v as u64)),
            ("ring_capacity", options.ring_capacity.map(|v| v as u64)),
            ("poll_interval_ms", options.poll_interval_ms),
        ];
        for (option, value) in zeroes {
            if value == Some(0) {
                self.errors.push(ValidationError::InvalidOption {
                    option: option.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
    }

    fn check_path(&mut self, path: &[PathElementConfig], depth: usize) {
        for element in path {
            match element {
                PathElementConfig::Module(module) => self.check_module(module, depth),
                PathElementConfig::Path(nested) => self.check_path(&nested.path, depth),
            }
        }
    }

    fn check_module(&mut self, module: &ModuleConfig, depth: usize) {
        self.modules += 1;
        let name = module.instance_name();

        if !self.names.insert(name.to_string()) {
            self.errors.push(ValidationError::DuplicateModuleName {
                name: name.to_string(),
            });
        }

        match self.registry.param_info(&module.module) {
            Ok(declared) => {
                for (parameter, value) in &module.params {
                    let Some(info) = declared.iter().find(|p| &p.name == parameter) else {
                        self.errors.push(ValidationError::UnknownParameter {
                            module: name.to_string(),
                            parameter: parameter.clone(),
                        });
                        continue;
                    };
                    if let Err(reason) = ParamValue::from_yaml(value, info.param_type) {
                        self.errors.push(ValidationError::InvalidParameter {
                            module: name.to_string(),
                            parameter: parameter.clone(),
                            reason,
                        });
                    }
                }
                for info in declared.iter().filter(|p| p.forced) {
                    if !module.params.contains_key(&info.name) {
                        self.errors.push(ValidationError::MissingParameter {
                            module: name.to_string(),
                            parameter: info.name.clone(),
                        });
                    }
                }
            }
            Err(_) => self.errors.push(ValidationError::UnknownModuleType {
                module_type: module.module.clone(),
            }),
        }

        for condition in &module.conditions {
            if let Err(e) = condition.expression.parse::<ConditionExpression>() {
                let reason = match e {
                    PathError::InvalidCondition { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.errors.push(ValidationError::InvalidCondition {
                    module: name.to_string(),
                    expression: condition.expression.clone(),
                    reason,
                });
            }
            if count_modules(&condition.path) == 0 {
                self.errors.push(ValidationError::EmptyConditionPath {
                    module: name.to_string(),
                    expression: condition.expression.clone(),
                });
            }
            if depth + 1 > self.max_depth {
                self.errors.push(ValidationError::BranchDepthExceeded {
                    depth: depth + 1 + branch_depth(&condition.path),
                    max: self.max_depth,
                });
                continue;
            }
            self.check_path(&condition.path, depth + 1);
        }
    }
}

fn count_modules(path: &[PathElementConfig]) -> usize {
    path.iter()
        .map(|element| match element {
            PathElementConfig::Module(_) => 1,
            PathElementConfig::Path(nested) => count_modules(&nested.path),
        })
        .sum()
}

fn branch_depth(path: &[PathElementConfig]) -> usize {
    path.iter()
        .map(|element| match element {
            PathElementConfig::Module(module) => module
                .conditions
                .iter()
                .map(|c| 1 + branch_depth(&c.path))
                .max()
                .unwrap_or(0),
            PathElementConfig::Path(nested) => branch_depth(&nested.path),
        })
        .max()
        .unwrap_or(0)
}
