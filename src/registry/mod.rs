// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Module Registry
//!
//! Maps module type names to constructors. Steering files refer to module types by
//! name; the registry builds a fresh [`ModuleInstance`] for every reference and is
//! also what parallel execution uses to give each worker its own copies.

mod provider;

pub use provider::{ModuleFactory, ModuleProvider};

use crate::errors::RegistryError;
use crate::module::{ModuleInstance, ModuleProperties, ParamInfo};
use crate::observability::messages::{module::ModuleTypeRegistered, StructuredLog};
use std::collections::HashMap;

#[derive(Clone, Default, Debug)]
pub struct ModuleRegistry {
    providers: HashMap<String, ModuleProvider>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the modules shipped with the crate.
    pub fn with_builtin_modules() -> Self {
        let mut registry = Self::new();
        for provider in crate::backends::builtin::providers() {
            registry
                .providers
                .entry(provider.type_name.clone())
                .or_insert(provider);
        }
        registry
    }

    /// Adds a module type. Its parameter declarations are checked once up front.
    pub fn register(&mut self, provider: ModuleProvider) -> Result<(), RegistryError> {
        if self.providers.contains_key(&provider.type_name) {
            return Err(RegistryError::DuplicateType {
                type_name: provider.type_name.clone(),
            });
        }
        let (module, params) = provider.build();
        if let Some(source) = params.declaration_errors().first() {
            return Err(RegistryError::Declaration {
                type_name: provider.type_name.clone(),
                source: source.clone(),
            });
        }
        ModuleTypeRegistered {
            type_name: &provider.type_name,
            parameters: params.info().len(),
            properties: module.properties(),
        }
        .log();
        self.providers.insert(provider.type_name.clone(), provider);
        Ok(())
    }

    /// Registers every provider of a library; returns how many were added.
    pub fn scan(
        &mut self,
        providers: impl IntoIterator<Item = ModuleProvider>,
    ) -> Result<usize, RegistryError> {
        let mut count = 0;
        for provider in providers {
            self.register(provider)?;
            count += 1;
        }
        Ok(count)
    }

    fn provider(&self, type_name: &str) -> Result<&ModuleProvider, RegistryError> {
        self.providers
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// New instance named after its type, with default parameters.
    pub fn create(&self, type_name: &str) -> Result<ModuleInstance, RegistryError> {
        let provider = self.provider(type_name)?;
        let (module, params) = provider.build();
        if let Some(source) = params.declaration_errors().first() {
            return Err(RegistryError::Declaration {
                type_name: type_name.to_string(),
                source: source.clone(),
            });
        }
        Ok(ModuleInstance::from_registry(type_name, module, params))
    }

    pub fn param_info(&self, type_name: &str) -> Result<Vec<ParamInfo>, RegistryError> {
        let (_, params) = self.provider(type_name)?.build();
        Ok(params.info())
    }

    pub fn properties(&self, type_name: &str) -> Result<ModuleProperties, RegistryError> {
        let (module, _) = self.provider(type_name)?.build();
        Ok(module.properties())
    }

    pub fn description(&self, type_name: &str) -> Option<&str> {
        self.providers.get(type_name).map(|p| p.description.as_str())
    }

    /// Registered type names, sorted.
    pub fn list_available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_available(&self, type_name: &str) -> bool {
        self.providers.contains_key(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ModuleResult, ParamError};
    use crate::module::{ModuleContext, ParamList};
    use crate::traits::Module;

    struct Noop;

    impl Module for Noop {
        fn event(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
            Ok(())
        }
    }

    fn noop(params: &mut ParamList) -> Box<dyn Module> {
        params.add("threshold", 0.5f64, "cut value");
        Box::new(Noop)
    }

    #[test]
    fn test_builtin_modules_are_available() {
        let registry = ModuleRegistry::with_builtin_modules();
        for name in ["EventInfoSetter", "EventInfoPrinter", "EventCounter", "Modulo", "JsonOutput"] {
            assert!(registry.is_available(name), "{} missing", name);
        }
        let listed = registry.list_available();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleProvider::new("Noop", "does nothing", noop))
            .unwrap();

        let instance = registry.create("Noop").unwrap();
        assert_eq!(instance.name(), "Noop");
        assert_eq!(instance.params().get::<f64>("threshold"), Ok(0.5));
        assert_eq!(registry.description("Noop"), Some("does nothing"));
        assert_eq!(registry.param_info("Noop").unwrap().len(), 1);
    }

    #[test]
    fn test_registry_errors() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleProvider::new("Noop", "", noop))
            .unwrap();

        assert!(matches!(
            registry.register(ModuleProvider::new("Noop", "", noop)),
            Err(RegistryError::DuplicateType { .. })
        ));
        assert!(matches!(
            registry.create("Missing"),
            Err(RegistryError::UnknownType { .. })
        ));

        let twice = ModuleProvider::new("Twice", "", |params: &mut ParamList| {
            params.add("x", 1i64, "");
            params.add("x", 2i64, "");
            Box::new(Noop) as Box<dyn Module>
        });
        assert!(matches!(
            registry.register(twice),
            Err(RegistryError::Declaration {
                source: ParamError::Duplicate { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_replicated_instances_keep_parameters() {
        let mut registry = ModuleRegistry::new();
        registry.scan([ModuleProvider::new("Noop", "", noop)]).unwrap();

        let mut instance = registry.create("Noop").unwrap().with_name("cut");
        instance.set_param("threshold", 0.9f64).unwrap();

        let copy = instance.replicate(&registry).unwrap();
        assert_eq!(copy.name(), "cut");
        assert_eq!(copy.params().get::<f64>("threshold"), Ok(0.9));
    }
}
