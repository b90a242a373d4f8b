// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::datastore::{Durability, EventMetaData, StoreObjPtr, EVENT_METADATA};
use crate::errors::{ModuleError, ModuleResult, ParamError};
use crate::module::{ModuleContext, ModuleProperties, ParamList};
use crate::traits::Module;

/// Event Info Setter - the master module that numbers events.
///
/// Produces `evtNumList[i]` events for experiment `expList[i]` and run
/// `runList[i]`, block after block, then flags end of data. Event numbers restart
/// at 1 in every block.
#[derive(Default)]
pub struct EventInfoSetter {
    meta: Option<StoreObjPtr<EventMetaData>>,
    blocks: Vec<Block>,
    block: usize,
    event_in_block: u64,
    production_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    experiment: u32,
    run: u32,
    events: u64,
}

impl EventInfoSetter {
    pub const TYPE_NAME: &'static str = "EventInfoSetter";

    pub fn declare(params: &mut ParamList) {
        params.add("evtNumList", vec![1i64], "number of events per run");
        params.add("runList", vec![0i64], "run number of each block");
        params.add("expList", vec![0i64], "experiment number of each block");
    }

    fn blocks(ctx: &ModuleContext<'_>) -> Result<Vec<Block>, ParamError> {
        let events = ctx.param::<Vec<i64>>("evtNumList")?;
        let runs = ctx.param::<Vec<i64>>("runList")?;
        let experiments = ctx.param::<Vec<i64>>("expList")?;

        if runs.len() != events.len() || experiments.len() != events.len() {
            return Err(ParamError::InvalidValue {
                name: "evtNumList".to_string(),
                reason: format!(
                    "evtNumList, runList and expList must have the same length ({}, {}, {})",
                    events.len(),
                    runs.len(),
                    experiments.len()
                ),
            });
        }

        let number = |name: &str, value: i64| {
            u32::try_from(value).map_err(|_| ParamError::InvalidValue {
                name: name.to_string(),
                reason: format!("{} is not a valid number", value),
            })
        };
        events
            .iter()
            .zip(&runs)
            .zip(&experiments)
            .map(|((&count, &run), &experiment)| {
                Ok(Block {
                    experiment: number("expList", experiment)?,
                    run: number("runList", run)?,
                    events: number("evtNumList", count)? as u64,
                })
            })
            .collect()
    }
}

impl Module for EventInfoSetter {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::input_module()
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        self.blocks = Self::blocks(ctx)?;
        self.meta = Some(
            ctx.store_mut()
                .declare_object::<EventMetaData>(EVENT_METADATA, Durability::Persistent)?,
        );
        Ok(())
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let meta = self
            .meta
            .ok_or_else(|| ModuleError::fatal("event called before initialize"))?;

        while let Some(block) = self.blocks.get(self.block) {
            if self.event_in_block < block.events {
                break;
            }
            self.block += 1;
            self.event_in_block = 0;
        }
        let Some(block) = self.blocks.get(self.block) else {
            meta.assign(ctx.store_mut(), EventMetaData::end_of_data())?;
            return Ok(());
        };

        self.event_in_block += 1;
        self.production_time += 1;
        let mut data = EventMetaData::new(block.experiment, block.run, self.event_in_block);
        data.production_time = self.production_time;
        meta.assign(ctx.store_mut(), data)?;
        Ok(())
    }
}
