// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ModuleResult;
use crate::module::{ModuleContext, ModuleProperties};
use crate::observability::messages::{module::EventInfo, StructuredLog};
use crate::traits::Module;

/// Event Info Printer - logs the metadata of every event it sees
pub struct EventInfoPrinter;

impl EventInfoPrinter {
    pub const TYPE_NAME: &'static str = "EventInfoPrinter";
}

impl Module for EventInfoPrinter {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::transformer()
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let meta = ctx.event_metadata();
        EventInfo {
            module: ctx.module_name(),
            role: ctx.role(),
            event: meta.into(),
            production_time: meta.map_or(0, |m| m.production_time),
        }
        .log();
        Ok(())
    }
}
