// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-module call counts and elapsed time, per lifecycle phase.

use crate::module::Phase;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleStatistics {
    pub name: String,
    calls: [u64; 5],
    elapsed: [Duration; 5],
}

impl ModuleStatistics {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self, phase: Phase) -> u64 {
        self.calls[phase.index()]
    }

    pub fn elapsed(&self, phase: Phase) -> Duration {
        self.elapsed[phase.index()]
    }

    pub fn total_elapsed(&self) -> Duration {
        self.elapsed.iter().sum()
    }

    fn record(&mut self, phase: Phase, elapsed: Duration) {
        self.calls[phase.index()] += 1;
        self.elapsed[phase.index()] += elapsed;
    }

    fn absorb(&mut self, other: &ModuleStatistics) {
        for phase in Phase::ALL {
            self.calls[phase.index()] += other.calls[phase.index()];
            self.elapsed[phase.index()] += other.elapsed[phase.index()];
        }
    }
}

/// Statistics of every module of one or more contexts, in path order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    modules: Vec<ModuleStatistics>,
}

impl Statistics {
    pub fn with_modules<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            modules: names.into_iter().map(ModuleStatistics::new).collect(),
        }
    }

    /// `slot` is the position the module was given in [`with_modules`](Self::with_modules).
    pub fn record(&mut self, slot: usize, phase: Phase, elapsed: Duration) {
        if let Some(module) = self.modules.get_mut(slot) {
            module.record(phase, elapsed);
        }
    }

    /// Adds another context's numbers; modules are matched by instance name.
    pub fn merge(&mut self, other: &Statistics) {
        for theirs in &other.modules {
            match self.modules.iter_mut().find(|m| m.name == theirs.name) {
                Some(ours) => ours.absorb(theirs),
                None => self.modules.push(theirs.clone()),
            }
        }
    }

    pub fn modules(&self) -> &[ModuleStatistics] {
        &self.modules
    }

    pub fn get(&self, name: &str) -> Option<&ModuleStatistics> {
        self.modules.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24}", "module")?;
        for phase in Phase::ALL {
            write!(f, " {:>10}", phase.to_string())?;
        }
        writeln!(f, " {:>12} {:>12}", "time [ms]", "event [us]")?;
        for module in &self.modules {
            write!(f, "{:<24}", module.name)?;
            for phase in Phase::ALL {
                write!(f, " {:>10}", module.calls(phase))?;
            }
            let events = module.calls(Phase::Event);
            let mean_event = if events == 0 {
                0
            } else {
                module.elapsed(Phase::Event).as_micros() / u128::from(events)
            };
            writeln!(
                f,
                " {:>12.3} {:>12}",
                module.total_elapsed().as_secs_f64() * 1000.0,
                mean_event
            )?;
        }
        Ok(())
    }
}

/// Events a context finished, abandoned or received from its master.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounters {
    /// Events the master produced; only meaningful where a master runs
    pub produced: u64,
    pub processed: u64,
    pub skipped: u64,
}

/// What a finished job reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub mode: &'static str,
    pub events_processed: u64,
    pub events_skipped: u64,
    pub statistics: Statistics,
}
