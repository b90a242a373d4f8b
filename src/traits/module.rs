// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ModuleResult;
use crate::module::{ModuleContext, ModuleProperties};

/// A processing unit of a path.
///
/// Parameters are declared by the constructor registered with the
/// [`ModuleRegistry`](crate::registry::ModuleRegistry); store entries are
/// declared in [`initialize`](Module::initialize). Only [`event`](Module::event)
/// is mandatory.
pub trait Module: Send {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::default()
    }

    fn initialize(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
        Ok(())
    }

    fn begin_run(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
        Ok(())
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult;

    fn end_run(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
        Ok(())
    }

    fn terminate(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
        Ok(())
    }
}
