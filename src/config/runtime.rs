// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{Config, ModuleConfig, PathElementConfig};
use crate::engine::factory::ExecutorFactory;
use crate::errors::{ExecutionError, ParamError, ValidationError};
use crate::module::ModuleInstance;
use crate::path::Path;
use crate::registry::ModuleRegistry;
use crate::traits::EventExecutor;
use std::sync::Arc;

/// Job runtime builder - turns a steering configuration into a module path and
/// the executor that runs it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use the_pathway::config::{Config, RuntimeBuilder};
/// use the_pathway::registry::ModuleRegistry;
///
/// let config: Config = serde_yaml::from_str(
///     "processes: 0\npath:\n  - module: EventInfoSetter\n  - module: EventCounter\n",
/// )
/// .unwrap();
///
/// let registry = Arc::new(ModuleRegistry::with_builtin_modules());
/// let (path, executor) = RuntimeBuilder::from_config(&config, registry).unwrap();
///
/// assert_eq!(path.module_names(), vec!["EventInfoSetter", "EventCounter"]);
/// assert_eq!(executor.mode(), "single");
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the path and the executor for `cfg`.
    ///
    /// # Returns
    /// A tuple of (Path, EventExecutor) ready for `executor.process(path)`
    pub fn from_config(
        cfg: &Config,
        registry: Arc<ModuleRegistry>,
    ) -> Result<(Path, Box<dyn EventExecutor>), ExecutionError> {
        let path = Self::build_path(&cfg.path, &registry)?;
        if path.is_empty() {
            return Err(ValidationError::EmptyPath.into());
        }
        let depth = path.branch_depth();
        if depth > cfg.max_branch_depth {
            return Err(ValidationError::BranchDepthExceeded {
                depth,
                max: cfg.max_branch_depth,
            }
            .into());
        }

        let executor = ExecutorFactory::from_config(cfg, registry);
        Ok((path, executor))
    }

    /// Create every module of `elements` through `registry`, bind its parameters
    /// and attach its conditional sub-paths.
    pub fn build_path(
        elements: &[PathElementConfig],
        registry: &ModuleRegistry,
    ) -> Result<Path, ExecutionError> {
        let mut path = Path::new();
        for element in elements {
            match element {
                PathElementConfig::Module(module) => {
                    path.add_module(Self::build_module(module, registry)?);
                }
                PathElementConfig::Path(nested) => {
                    path.add_path(Self::build_path(&nested.path, registry)?);
                }
            }
        }
        Ok(path)
    }

    fn build_module(
        cfg: &ModuleConfig,
        registry: &ModuleRegistry,
    ) -> Result<ModuleInstance, ExecutionError> {
        let name = cfg.instance_name();
        let mut instance = registry.create(&cfg.module)?.with_name(name);

        for (parameter, value) in &cfg.params {
            instance
                .set_param_yaml(parameter, value)
                .map_err(|e| param_error(name, parameter, e))?;
        }
        instance
            .params()
            .check_forced()
            .map_err(|e| param_error(name, "", e))?;

        for condition in &cfg.conditions {
            let branch = Self::build_path(&condition.path, registry)?;
            instance
                .if_value(&condition.expression, branch, condition.after)
                .map_err(|e| ValidationError::InvalidCondition {
                    module: name.to_string(),
                    expression: condition.expression.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(instance)
    }
}

fn param_error(module: &str, parameter: &str, error: ParamError) -> ExecutionError {
    let module = module.to_string();
    let error = match error {
        ParamError::Unknown { name } => ValidationError::UnknownParameter {
            module,
            parameter: name,
        },
        ParamError::NotSet { name } => ValidationError::MissingParameter {
            module,
            parameter: name,
        },
        other => ValidationError::InvalidParameter {
            module,
            parameter: parameter.to_string(),
            reason: other.to_string(),
        },
    };
    error.into()
}
