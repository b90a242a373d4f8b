// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::controller::{ProcessController, RunOptions};
use crate::engine::parallel::{ParallelExecutor, ParallelOptions};
use crate::engine::signals::ShutdownSignals;
use crate::registry::ModuleRegistry;
use crate::traits::EventExecutor;
use std::sync::Arc;

/// Factory for creating event executors from configuration
pub struct ExecutorFactory;

impl ExecutorFactory {
    /// Create an executor for `cfg.processes` worker contexts; 0 selects the
    /// single-context controller.
    pub fn from_config(cfg: &Config, registry: Arc<ModuleRegistry>) -> Box<dyn EventExecutor> {
        let options = &cfg.executor_options;
        let run = RunOptions {
            max_events: cfg.max_events,
            max_branch_depth: cfg.max_branch_depth,
        };
        let signals = ShutdownSignals::new(options.get_grace_period());

        match cfg.processes {
            0 => Box::new(ProcessController::with_signals(run, signals)),
            workers => Box::new(ParallelExecutor::with_signals(
                registry,
                ParallelOptions {
                    workers,
                    window_factor: options.get_window_factor(),
                    ring_capacity: options.get_ring_capacity(),
                    poll_interval: options.get_poll_interval(),
                },
                run,
                signals,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_selection() {
        struct TestCase {
            processes: usize,
            expected_mode: &'static str,
        }

        let cases = vec![
            TestCase {
                processes: 0,
                expected_mode: "single",
            },
            TestCase {
                processes: 1,
                expected_mode: "parallel",
            },
            TestCase {
                processes: 8,
                expected_mode: "parallel",
            },
        ];

        let registry = Arc::new(ModuleRegistry::with_builtin_modules());
        for case in cases {
            let cfg: Config = serde_yaml::from_str(&format!(
                "processes: {}\npath:\n  - module: EventCounter\n",
                case.processes
            ))
            .unwrap();
            let executor = ExecutorFactory::from_config(&cfg, registry.clone());
            assert_eq!(executor.mode(), case.expected_mode);
        }
    }
}
