// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::module::ParamList;
use crate::traits::Module;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh module and declares its parameters on the given list.
pub type ModuleFactory = Arc<dyn Fn(&mut ParamList) -> Box<dyn Module> + Send + Sync>;

/// A module type that can be instantiated by name.
#[derive(Clone)]
pub struct ModuleProvider {
    pub type_name: String,
    pub description: String,
    pub(crate) factory: ModuleFactory,
}

impl ModuleProvider {
    pub fn new<F>(type_name: &str, description: &str, factory: F) -> Self
    where
        F: Fn(&mut ParamList) -> Box<dyn Module> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.to_string(),
            description: description.to_string(),
            factory: Arc::new(factory),
        }
    }

    pub(crate) fn build(&self) -> (Box<dyn Module>, ParamList) {
        let mut params = ParamList::new();
        let module = (self.factory)(&mut params);
        (module, params)
    }
}

impl fmt::Debug for ModuleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleProvider")
            .field("type_name", &self.type_name)
            .field("description", &self.description)
            .finish()
    }
}
