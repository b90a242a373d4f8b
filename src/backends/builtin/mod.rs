// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Modules shipped with the crate.
//!
//! | Type                          | Role     | Parallel-safe |
//! |-------------------------------|----------|---------------|
//! | `EventInfoSetter`             | input    | no            |
//! | `EventInfoPrinter`            | -        | yes           |
//! | `EventCounter`                | -        | yes           |
//! | `Modulo` / `ReturnValueSetter`| -        | yes           |
//! | `JsonOutput`                  | output   | no            |

pub mod event_counter;
pub mod event_info_printer;
pub mod event_info_setter;
pub mod json_output;
pub mod modulo;

pub use event_counter::{EventCount, EventCounter};
pub use event_info_printer::EventInfoPrinter;
pub use event_info_setter::EventInfoSetter;
pub use json_output::JsonOutput;
pub use modulo::Modulo;

use crate::module::ParamList;
use crate::registry::ModuleProvider;
use crate::traits::Module;

/// Providers for every built-in module type
pub fn providers() -> Vec<ModuleProvider> {
    vec![
        ModuleProvider::new(
            EventInfoSetter::TYPE_NAME,
            "Produces event metadata for the configured runs",
            |params: &mut ParamList| {
                EventInfoSetter::declare(params);
                Box::new(EventInfoSetter::default()) as Box<dyn Module>
            },
        ),
        ModuleProvider::new(
            EventInfoPrinter::TYPE_NAME,
            "Logs the metadata of every event",
            |_params: &mut ParamList| Box::new(EventInfoPrinter) as Box<dyn Module>,
        ),
        ModuleProvider::new(
            EventCounter::TYPE_NAME,
            "Counts events and runs",
            |_params: &mut ParamList| Box::new(EventCounter::default()) as Box<dyn Module>,
        ),
        ModuleProvider::new(
            Modulo::TYPE_NAME,
            "Returns the event number modulo a divisor",
            |params: &mut ParamList| {
                Modulo::declare(params);
                Box::new(Modulo) as Box<dyn Module>
            },
        ),
        ModuleProvider::new(
            Modulo::ALIAS,
            "Returns the event number modulo a divisor",
            |params: &mut ParamList| {
                Modulo::declare(params);
                Box::new(Modulo) as Box<dyn Module>
            },
        ),
        ModuleProvider::new(
            JsonOutput::TYPE_NAME,
            "Writes one JSON line per event to a file",
            |params: &mut ParamList| {
                JsonOutput::declare(params);
                Box::new(JsonOutput::default()) as Box<dyn Module>
            },
        ),
    ]
}
