// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recording modules for engine tests.
//!
//! Every module writes each lifecycle call into a shared [`Journal`], tagged with
//! its instance name, the role of the context it runs in and the event number.

use crate::datastore::{Durability, EventMetaData, StoreArray, StoreObjPtr, EVENT_METADATA};
use crate::errors::{ModuleError, ModuleResult};
use crate::module::{ModuleContext, ModuleProperties, ParamList, Phase, ProcessRole};
use crate::registry::{ModuleProvider, ModuleRegistry};
use crate::traits::Module;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub module: String,
    pub role: ProcessRole,
    pub phase: Phase,
    pub event: Option<u64>,
}

#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

pub type SharedJournal = Arc<Mutex<Journal>>;

impl Journal {
    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn count(&self, module: &str, phase: Phase) -> usize {
        self.entries
            .iter()
            .filter(|e| e.module == module && e.phase == phase)
            .count()
    }

    pub fn count_in(&self, module: &str, phase: Phase, role: ProcessRole) -> usize {
        self.entries
            .iter()
            .filter(|e| e.module == module && e.phase == phase && e.role == role)
            .count()
    }

    /// Event numbers the module saw, in call order.
    pub fn events(&self, module: &str) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|e| e.module == module && e.phase == Phase::Event)
            .filter_map(|e| e.event)
            .collect()
    }

    pub fn first_index(&self, module: &str, phase: Phase) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.module == module && e.phase == phase)
    }

    pub fn last_index(&self, module: &str, phase: Phase) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|e| e.module == module && e.phase == phase)
    }

    pub fn roles(&self, module: &str, phase: Phase) -> Vec<ProcessRole> {
        self.entries
            .iter()
            .filter(|e| e.module == module && e.phase == phase)
            .map(|e| e.role)
            .collect()
    }
}

fn record(journal: &SharedJournal, ctx: &ModuleContext<'_>, phase: Phase) {
    journal.lock().record(JournalEntry {
        module: ctx.module_name().to_string(),
        role: ctx.role(),
        phase,
        event: ctx.event_metadata().filter(|m| !m.end_of_data).map(|m| m.event),
    });
}

/// Produces `evts` events, `runLength` per run, then flags end of data.
struct Master {
    journal: SharedJournal,
    meta: Option<StoreObjPtr<EventMetaData>>,
    produced: u64,
}

impl Module for Master {
    fn properties(&self) -> ModuleProperties {
        ModuleProperties::input_module()
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::Initialize);
        self.meta = Some(
            ctx.store_mut()
                .declare_object::<EventMetaData>(EVENT_METADATA, Durability::Persistent)?,
        );
        Ok(())
    }

    fn begin_run(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::BeginRun);
        Ok(())
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        let meta = self
            .meta
            .ok_or_else(|| ModuleError::fatal("event before initialize"))?;
        let events = ctx.param::<i64>("evts")?.max(0) as u64;
        if self.produced >= events {
            if ctx.param::<bool>("returnEndOfData")? {
                return Err(ModuleError::EndOfData);
            }
            meta.assign(ctx.store_mut(), EventMetaData::end_of_data())?;
            return Ok(());
        }

        self.produced += 1;
        let run_length = ctx.param::<i64>("runLength")?;
        let run = if run_length > 0 {
            1 + (self.produced - 1) / run_length as u64
        } else {
            1
        };
        let mut data = EventMetaData::new(0, run as u32, self.produced);
        data.production_time = self.produced;
        meta.assign(ctx.store_mut(), data)?;
        record(&self.journal, ctx, Phase::Event);
        Ok(())
    }

    fn end_run(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::EndRun);
        Ok(())
    }

    fn terminate(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::Terminate);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub producer: String,
    pub event: u64,
}

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Pass,
    Decide,
    Flaky,
    Sleep,
    Fatal,
    EndOfData,
}

/// Records every call; what it does on `event` depends on its behavior.
struct Recorder {
    journal: SharedJournal,
    properties: ModuleProperties,
    behavior: Behavior,
    payloads: Option<StoreArray<Payload>>,
}

impl Recorder {
    fn fail_in(&self, ctx: &ModuleContext<'_>, phase: Phase) -> ModuleResult {
        if !matches!(self.behavior, Behavior::Fatal) {
            return Ok(());
        }
        if ctx.param::<String>("phase")? == phase.to_string() {
            let on_event = ctx.param::<i64>("onEvent")?;
            let event = ctx.event_metadata().map_or(0, |m| m.event as i64);
            if phase != Phase::Event || event == on_event {
                return Err(ModuleError::fatal(format!("configured to fail in {}", phase)));
            }
        }
        Ok(())
    }
}

impl Module for Recorder {
    fn properties(&self) -> ModuleProperties {
        self.properties
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::Initialize);
        if ctx.params().contains("produce") {
            self.payloads = Some(
                ctx.store_mut()
                    .declare_array::<Payload>("Payloads", Durability::Event)?,
            );
        }
        self.fail_in(ctx, Phase::Initialize)
    }

    fn begin_run(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::BeginRun);
        self.fail_in(ctx, Phase::BeginRun)
    }

    fn event(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::Event);
        let event = ctx.event_metadata().map_or(0, |m| m.event);

        if let Some(payloads) = self.payloads {
            for _ in 0..ctx.param::<i64>("produce")? {
                let payload = Payload {
                    producer: ctx.module_name().to_string(),
                    event,
                };
                payloads.append(ctx.store_mut(), payload)?;
            }
        }

        match self.behavior {
            Behavior::Pass => Ok(()),
            Behavior::Decide => {
                let modulus = ctx.param::<i64>("modulus")?;
                ctx.set_return_value(event as i64 % modulus);
                Ok(())
            }
            Behavior::Flaky => {
                if ctx.param::<Vec<i64>>("failOn")?.contains(&(event as i64)) {
                    return Err(ModuleError::recoverable(format!("flaky on event {}", event)));
                }
                Ok(())
            }
            Behavior::Sleep => {
                let max = ctx.param::<i64>("maxSleepMicros")?.max(0) as u64;
                let micros = rand::rng().random_range(0..=max);
                std::thread::sleep(Duration::from_micros(micros));
                Ok(())
            }
            Behavior::Fatal => self.fail_in(ctx, Phase::Event),
            Behavior::EndOfData => {
                if event as i64 == ctx.param::<i64>("at")? {
                    return Err(ModuleError::EndOfData);
                }
                Ok(())
            }
        }
    }

    fn end_run(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::EndRun);
        self.fail_in(ctx, Phase::EndRun)
    }

    fn terminate(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult {
        record(&self.journal, ctx, Phase::Terminate);
        self.fail_in(ctx, Phase::Terminate)
    }
}

fn recorder(
    type_name: &str,
    journal: &SharedJournal,
    properties: ModuleProperties,
    behavior: Behavior,
    declare: fn(&mut ParamList),
) -> ModuleProvider {
    let journal = Arc::clone(journal);
    ModuleProvider::new(type_name, "test recorder", move |params: &mut ParamList| {
        declare(params);
        Box::new(Recorder {
            journal: Arc::clone(&journal),
            properties,
            behavior,
            payloads: None,
        }) as Box<dyn Module>
    })
}

fn no_params(_params: &mut ParamList) {}

/// Registry of recording modules together with the journal they write to.
pub fn journaled_registry() -> (ModuleRegistry, SharedJournal) {
    let journal = SharedJournal::default();
    let mut registry = ModuleRegistry::new();

    let master_journal = Arc::clone(&journal);
    let providers = vec![
        ModuleProvider::new("Master", "test input", move |params: &mut ParamList| {
            params.add("evts", 3i64, "number of events");
            params.add("runLength", 0i64, "events per run, 0 for a single run");
            params.add("returnEndOfData", false, "return EndOfData instead of flagging it");
            Box::new(Master {
                journal: Arc::clone(&master_journal),
                meta: None,
                produced: 0,
            }) as Box<dyn Module>
        }),
        recorder(
            "Transform",
            &journal,
            ModuleProperties::transformer(),
            Behavior::Pass,
            |params| params.add("produce", 0i64, "payloads appended per event"),
        ),
        recorder("Branch", &journal, ModuleProperties::transformer(), Behavior::Pass, no_params),
        recorder("Sink", &journal, ModuleProperties::output_module(), Behavior::Pass, no_params),
        recorder("Writer", &journal, ModuleProperties::output_module(), Behavior::Pass, no_params),
        recorder(
            "NotParallelSafe",
            &journal,
            ModuleProperties::default(),
            Behavior::Pass,
            no_params,
        ),
        recorder(
            "Decider",
            &journal,
            ModuleProperties::transformer(),
            Behavior::Decide,
            |params| params.add("modulus", 2i64, "return value = event mod modulus"),
        ),
        recorder(
            "Flaky",
            &journal,
            ModuleProperties::transformer(),
            Behavior::Flaky,
            |params| params.add("failOn", Vec::<i64>::new(), "events that fail recoverably"),
        ),
        recorder(
            "SlowWorker",
            &journal,
            ModuleProperties::transformer(),
            Behavior::Sleep,
            |params| params.add("maxSleepMicros", 500i64, "upper bound of the random sleep"),
        ),
        recorder(
            "Fatal",
            &journal,
            ModuleProperties::transformer(),
            Behavior::Fatal,
            |params| {
                params.add("phase", "event".to_string(), "phase that fails");
                params.add("onEvent", 1i64, "event that fails when phase is event");
            },
        ),
        recorder(
            "Ender",
            &journal,
            ModuleProperties::transformer(),
            Behavior::EndOfData,
            |params| params.add("at", 1i64, "event that returns EndOfData"),
        ),
    ];

    for provider in providers {
        if let Err(e) = registry.register(provider) {
            panic!("test registry: {}", e);
        }
    }
    (registry, journal)
}

pub fn test_registry() -> ModuleRegistry {
    journaled_registry().0
}
