// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{ModuleResult, ParamError};
use crate::module::{ModuleContext, ModuleProperties, ParamList};
use crate::traits::Module;

/// Modulo - sets the return value to `event number mod divisor`, for steering
/// events into conditional paths.
///
/// Also registered as `ReturnValueSetter`.
pub struct Modulo;

impl Modulo {
    pub const TYPE_NAME: &'static str = "Modulo";
    pub const ALIAS: &'static str = "ReturnValueSetter";

    pub fn declare(params: &mut ParamList) {
        params.add("divisor", 2i64, "the event number is divided by this value");
    }
}

impl Module for Modulo {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::transformer()
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        if ctx.param::<i64>("divisor")? <= 0 {
            return Err(ParamError::InvalidValue {
                name: "divisor".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let divisor = ctx.param::<i64>("divisor")?;
        let event = ctx.event_metadata().map_or(0, |m| m.event as i64);
        ctx.set_return_value(event % divisor);
        Ok(())
    }
}
