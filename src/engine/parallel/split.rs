// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Splitting a path into input, worker and output segments.
//!
//! ```text
//! [ Master │ Reader ][ Calib  Fit  Select ][ Writer ]
//!   input segment       worker segment       output segment
//!   leading input       parallel-safe        trailing output
//!   modules             modules only         modules
//! ```
//!
//! A path without a leading input module, without a trailing output module or
//! without anything between them cannot be split; it runs in a single context
//! instead. A worker segment with a module that is not parallel-safe, also inside
//! its conditional branches, is refused.

use crate::errors::ExecutionError;
use crate::module::ModuleInstance;
use crate::path::Path;

#[derive(Debug)]
pub enum SplitDecision {
    Parallel(SplitPath),
    /// The path comes back unchanged with the reason it was not split.
    Single { path: Path, reason: String },
}

#[derive(Debug)]
pub struct SplitPath {
    pub input: Path,
    pub worker: Path,
    pub output: Path,
}

fn is_input(module: &ModuleInstance) -> bool {
    let properties = module.properties();
    properties.input && !properties.parallel_safe
}

fn is_output(module: &ModuleInstance) -> bool {
    let properties = module.properties();
    properties.output && !properties.parallel_safe
}

pub fn split_path(path: Path) -> Result<SplitDecision, ExecutionError> {
    let modules = path.flatten();
    let input_len = modules.iter().take_while(|m| is_input(m)).count();
    let output_len = modules[input_len..]
        .iter()
        .rev()
        .take_while(|m| is_output(m))
        .count();
    let worker_range = input_len..modules.len() - output_len;

    let fallback = if input_len == 0 {
        Some("the path does not start with an input module")
    } else if output_len == 0 {
        Some("the path does not end with an output module")
    } else if worker_range.is_empty() {
        Some("no modules between the input and output segments")
    } else if modules[..input_len]
        .iter()
        .chain(&modules[worker_range.end..])
        .any(|m| !m.conditions().is_empty())
    {
        Some("an input or output module has conditions")
    } else {
        None
    };
    if let Some(reason) = fallback {
        return Ok(SplitDecision::Single {
            path,
            reason: reason.to_string(),
        });
    }

    for module in &modules[worker_range.clone()] {
        let branches = module
            .conditions()
            .iter()
            .flat_map(|c| c.path.all_modules());
        if let Some(unsafe_module) = std::iter::once(*module)
            .chain(branches)
            .find(|m| !m.properties().parallel_safe)
        {
            return Err(ExecutionError::SplitRefused {
                module: unsafe_module.name().to_string(),
            });
        }
    }

    let (input_len, worker_end) = (worker_range.start, worker_range.end);
    let mut input = path.into_modules();
    let output = input.split_off(worker_end);
    let worker = input.split_off(input_len);
    Ok(SplitDecision::Parallel(SplitPath {
        input: Path::from_modules(input),
        worker: Path::from_modules(worker),
        output: Path::from_modules(output),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::test_registry;
    use crate::module::AfterConditionPath;
    use crate::registry::ModuleRegistry;

    fn path_of(registry: &ModuleRegistry, types: &[&str]) -> Path {
        Path::from_modules(types.iter().map(|t| registry.create(t).unwrap()))
    }

    #[test]
    fn test_segments() {
        struct TestCase {
            name: &'static str,
            types: Vec<&'static str>,
            segments: Option<(usize, usize, usize)>,
        }

        let cases = vec![
            TestCase {
                name: "input, two workers, output",
                types: vec!["Master", "Transform", "SlowWorker", "Sink"],
                segments: Some((1, 2, 1)),
            },
            TestCase {
                name: "two output modules",
                types: vec!["Master", "Transform", "Sink", "Writer"],
                segments: Some((1, 1, 2)),
            },
            TestCase {
                name: "no output module",
                types: vec!["Master", "Transform"],
                segments: None,
            },
            TestCase {
                name: "no input module",
                types: vec!["Transform", "Sink"],
                segments: None,
            },
            TestCase {
                name: "nothing to parallelize",
                types: vec!["Master", "Sink"],
                segments: None,
            },
        ];

        let registry = test_registry();
        for case in cases {
            let decision = split_path(path_of(&registry, &case.types)).unwrap();
            match (decision, case.segments) {
                (SplitDecision::Parallel(split), Some((i, w, o))) => {
                    assert_eq!(split.input.len(), i, "case '{}'", case.name);
                    assert_eq!(split.worker.len(), w, "case '{}'", case.name);
                    assert_eq!(split.output.len(), o, "case '{}'", case.name);
                }
                (SplitDecision::Single { path, .. }, None) => {
                    assert_eq!(path.len(), case.types.len(), "case '{}'", case.name);
                }
                (decision, _) => panic!("case '{}': unexpected {:?}", case.name, decision),
            }
        }
    }

    #[test]
    fn test_unsafe_worker_module_is_refused() {
        let registry = test_registry();
        let path = path_of(&registry, &["Master", "NotParallelSafe", "Writer"]);
        let err = split_path(path).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::SplitRefused {
                module: "NotParallelSafe".to_string()
            }
        );
        assert!(err.to_string().contains("NotParallelSafe"));
    }

    #[test]
    fn test_unsafe_module_in_branch_is_refused() {
        let registry = test_registry();
        let mut decider = registry.create("Decider").unwrap();
        let branch = Path::from_modules([registry.create("NotParallelSafe").unwrap().with_name("tagger")]);
        decider.if_value("== 1", branch, AfterConditionPath::Continue).unwrap();
        let path = Path::from_modules([
            registry.create("Master").unwrap(),
            decider,
            registry.create("Sink").unwrap(),
        ]);

        assert!(matches!(
            split_path(path),
            Err(ExecutionError::SplitRefused { module }) if module == "tagger"
        ));
    }

    #[test]
    fn test_conditions_on_output_module_fall_back() {
        let registry = test_registry();
        let mut sink = registry.create("Sink").unwrap();
        sink.if_value("== 0", Path::new(), AfterConditionPath::End).unwrap();
        let path = Path::from_modules([
            registry.create("Master").unwrap(),
            registry.create("Transform").unwrap(),
            sink,
        ]);

        assert!(matches!(
            split_path(path).unwrap(),
            SplitDecision::Single { reason, .. } if reason.contains("conditions")
        ));
    }
}
