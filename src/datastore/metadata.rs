// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the persistent entry the master module fills on every event.
pub const EVENT_METADATA: &str = "EventMetaData";

/// `(experiment, run)` pair; a change triggers endRun/beginRun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
    pub experiment: u32,
    pub run: u32,
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exp {} run {}", self.experiment, self.run)
    }
}

/// Event metadata produced by the master module.
///
/// `production_time` is monotonically increasing within one job. Setting
/// `end_of_data` tells the engine that no further event follows; the event carrying
/// the flag is not processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetaData {
    pub experiment: u32,
    pub run: u32,
    pub event: u64,
    pub production_time: u64,
    pub end_of_data: bool,
}

impl EventMetaData {
    pub fn new(experiment: u32, run: u32, event: u64) -> Self {
        Self {
            experiment,
            run,
            event,
            production_time: 0,
            end_of_data: false,
        }
    }

    pub fn end_of_data() -> Self {
        Self {
            end_of_data: true,
            ..Self::default()
        }
    }

    pub fn run_key(&self) -> RunKey {
        RunKey {
            experiment: self.experiment,
            run: self.run,
        }
    }
}

impl fmt::Display for EventMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end_of_data {
            write!(f, "end of data")
        } else {
            write!(
                f,
                "exp {} run {} evt {}",
                self.experiment, self.run, self.event
            )
        }
    }
}
