// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{ModuleError, ModuleResult};
use crate::module::{ModuleContext, ModuleProperties, ParamList};
use crate::traits::Module;
use std::fs::File;
use std::io::{BufWriter, Write};

/// JSON Output - writes every event it sees as one JSON line to `outputFile`.
///
/// A line holds the event metadata plus every event entry and relation that
/// reached the output context. Runs in the output context of a parallel job.
#[derive(Default)]
pub struct JsonOutput {
    writer: Option<BufWriter<File>>,
}

impl JsonOutput {
    pub const TYPE_NAME: &'static str = "JsonOutput";

    pub fn declare(params: &mut ParamList) {
        params.add_forced::<String>("outputFile", "file the events are written to");
    }

    fn flush(&mut self) -> ModuleResult {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| ModuleError::fatal(format!("flushing output: {}", e)))?;
        }
        Ok(())
    }
}

impl Module for JsonOutput {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::output_module()
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let path = ctx.param::<String>("outputFile")?;
        let file = File::create(&path)
            .map_err(|e| ModuleError::fatal(format!("cannot create '{}': {}", path, e)))?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let snapshot = ctx.store().snapshot_event()?;
        let line = serde_json::to_string(&snapshot)
            .map_err(|e| ModuleError::fatal(format!("encoding event: {}", e)))?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ModuleError::fatal("event called before initialize"))?;
        writeln!(writer, "{}", line)
            .map_err(|e| ModuleError::fatal(format!("writing event: {}", e)))?;
        Ok(())
    }

    fn end_run(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
        self.flush()
    }

    fn terminate(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult {
        self.flush()?;
        self.writer = None;
        Ok(())
    }
}
