// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::datastore::{DataStore, EventMetaData};
use crate::errors::ParamError;
use crate::module::{ParamKind, ParamList, ProcessRole};

/// What a module callback can see: its context's store, its own parameters, and a
/// slot for the return value conditions are evaluated against.
pub struct ModuleContext<'a> {
    store: &'a mut DataStore,
    params: &'a ParamList,
    name: &'a str,
    role: ProcessRole,
    return_value: Option<i64>,
}

impl<'a> ModuleContext<'a> {
    pub fn new(
        store: &'a mut DataStore,
        params: &'a ParamList,
        name: &'a str,
        role: ProcessRole,
    ) -> Self {
        Self {
            store,
            params,
            name,
            role,
            return_value: None,
        }
    }

    pub fn store(&self) -> &DataStore {
        self.store
    }

    pub fn store_mut(&mut self) -> &mut DataStore {
        self.store
    }

    pub fn param<T: ParamKind>(&self, name: &str) -> Result<T, ParamError> {
        self.params.get(name)
    }

    pub fn params(&self) -> &ParamList {
        self.params
    }

    pub fn module_name(&self) -> &str {
        self.name
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn event_metadata(&self) -> Option<&EventMetaData> {
        self.store.event_metadata()
    }

    pub fn set_return_value(&mut self, value: i64) {
        self.return_value = Some(value);
    }

    /// Boolean return value, tested by `if_true` and `if_false` conditions.
    pub fn set_return_bool(&mut self, value: bool) {
        self.return_value = Some(i64::from(value));
    }

    pub fn return_value(&self) -> Option<i64> {
        self.return_value
    }
}
