// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::datastore::{DataStore, Durability, StoreObjPtr};
use crate::errors::{ModuleError, ModuleResult};
use crate::module::{ModuleContext, ModuleProperties};
use crate::observability::messages::{module::EventsCounted, StructuredLog};
use crate::traits::Module;
use serde::{Deserialize, Serialize};

/// Persistent tally kept by [`EventCounter`]. Every context counts for itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCount {
    pub events: u64,
    pub runs: u64,
}

/// Event Counter - counts events and runs into a persistent `EventCount` entry
/// and reports the totals at terminate.
#[derive(Default)]
pub struct EventCounter {
    count: Option<StoreObjPtr<EventCount>>,
}

impl EventCounter {
    pub const TYPE_NAME: &'static str = "EventCounter";

    fn tally<'c>(
        &self,
        ctx: &'c mut ModuleContext<'_>,
    ) -> Result<&'c mut EventCount, ModuleError> {
        let count = self
            .count
            .ok_or_else(|| ModuleError::fatal("called before initialize"))?;
        count
            .get_mut(ctx.store_mut())?
            .ok_or_else(|| ModuleError::fatal("EventCount entry missing"))
    }
}

impl Module for EventCounter {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::transformer()
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let count = ctx.store_mut().declare_object::<EventCount>(
            &DataStore::default_name::<EventCount>(),
            Durability::Persistent,
        )?;
        count.assign(ctx.store_mut(), EventCount::default())?;
        self.count = Some(count);
        Ok(())
    }

    fn begin_run(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        self.tally(ctx)?.runs += 1;
        Ok(())
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        self.tally(ctx)?.events += 1;
        Ok(())
    }

    fn terminate(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let EventCount { events, runs } = self.tally(ctx)?.clone();
        EventsCounted {
            module: ctx.module_name(),
            role: ctx.role(),
            events,
            runs,
        }
        .log();
        Ok(())
    }
}
