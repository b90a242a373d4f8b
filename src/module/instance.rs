// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::datastore::DataStore;
use crate::errors::{ModuleResult, ParamError, PathError, RegistryError};
use crate::module::{
    AfterConditionPath, ConditionExpression, ModuleCondition, ModuleContext, ModuleProperties,
    ParamKind, ParamList, ParamValue, Phase, ProcessRole,
};
use crate::path::Path;
use crate::registry::ModuleRegistry;
use crate::traits::Module;
use std::fmt;

/// A configured module: implementation, instance name, parameters and conditions.
pub struct ModuleInstance {
    type_name: String,
    name: String,
    params: ParamList,
    module: Box<dyn Module>,
    conditions: Vec<ModuleCondition>,
    replicable: bool,
}

impl ModuleInstance {
    /// Wraps a module built outside the registry. Such an instance runs fine in a
    /// single context but cannot be copied into parallel workers.
    pub fn new(type_name: &str, module: Box<dyn Module>, params: ParamList) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: type_name.to_string(),
            params,
            module,
            conditions: Vec::new(),
            replicable: false,
        }
    }

    pub(crate) fn from_registry(type_name: &str, module: Box<dyn Module>, params: ParamList) -> Self {
        Self {
            replicable: true,
            ..Self::new(type_name, module, params)
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.set_name(name);
        self
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_param<T: ParamKind>(&mut self, name: &str, value: T) -> Result<(), ParamError> {
        self.params.set(name, value)
    }

    pub fn set_param_value(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        self.params.set_value(name, value)
    }

    pub fn set_param_yaml(&mut self, name: &str, value: &serde_yaml::Value) -> Result<(), ParamError> {
        self.params.set_yaml(name, value)
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    pub(crate) fn freeze_params(&mut self) {
        self.params.freeze();
    }

    pub fn properties(&self) -> ModuleProperties {
        self.module.properties()
    }

    /// Routes events into `path` when this module's return value matches `expression`.
    pub fn if_value(
        &mut self,
        expression: &str,
        path: Path,
        after: AfterConditionPath,
    ) -> Result<(), PathError> {
        let expression = expression.parse::<ConditionExpression>()?;
        self.add_condition(ModuleCondition::new(expression, path, after));
        Ok(())
    }

    /// Routes events into `path` when this module returned `true`.
    pub fn if_true(&mut self, path: Path, after: AfterConditionPath) {
        self.add_condition(ModuleCondition::new(ConditionExpression::when_true(), path, after));
    }

    /// Routes events into `path` when this module returned `false`.
    pub fn if_false(&mut self, path: Path, after: AfterConditionPath) {
        self.add_condition(ModuleCondition::new(ConditionExpression::when_false(), path, after));
    }

    pub fn add_condition(&mut self, condition: ModuleCondition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[ModuleCondition] {
        &self.conditions
    }

    pub(crate) fn take_conditions(&mut self) -> Vec<ModuleCondition> {
        std::mem::take(&mut self.conditions)
    }

    /// Invokes one lifecycle callback and returns its outcome together with the
    /// return value the module set, if any.
    pub fn call(
        &mut self,
        phase: Phase,
        store: &mut DataStore,
        role: ProcessRole,
    ) -> (ModuleResult, Option<i64>) {
        let mut ctx = ModuleContext::new(store, &self.params, &self.name, role);
        let result = match phase {
            Phase::Initialize => self.module.initialize(&mut ctx),
            Phase::BeginRun => self.module.begin_run(&mut ctx),
            Phase::Event => self.module.event(&mut ctx),
            Phase::EndRun => self.module.end_run(&mut ctx),
            Phase::Terminate => self.module.terminate(&mut ctx),
        };
        (result, ctx.return_value())
    }

    /// Builds an independent copy through the registry: same type, name,
    /// assigned parameters and conditions, fresh module state.
    pub fn replicate(&self, registry: &ModuleRegistry) -> Result<ModuleInstance, RegistryError> {
        if !self.replicable {
            return Err(RegistryError::NotReplicable {
                instance: self.name.clone(),
                type_name: self.type_name.clone(),
            });
        }
        let mut copy = registry.create(&self.type_name)?.with_name(&self.name);
        for (name, value) in self.params.assigned() {
            copy.params
                .set_value(&name, value)
                .map_err(|source| RegistryError::Parameter {
                    instance: self.name.clone(),
                    source,
                })?;
        }
        for condition in &self.conditions {
            copy.conditions.push(ModuleCondition::new(
                condition.expression,
                condition.path.replicate(registry)?,
                condition.after,
            ));
        }
        Ok(copy)
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("conditions", &self.conditions)
            .finish()
    }
}
