// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_GRACE_PERIOD_MS, DEFAULT_MAX_BRANCH_DEPTH, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_RING_CAPACITY, DEFAULT_WINDOW_FACTOR,
};
use crate::module::AfterConditionPath;
use crate::registry::ModuleRegistry;
use serde::{de, Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure of a job: how many worker contexts to use,
/// global limits and the module path to run.
///
/// # Fields
/// * `processes` - Number of worker contexts; 0 runs everything in one context
/// * `max_events` - Stop after this many events (optional)
/// * `max_branch_depth` - Maximum nesting of conditional sub-paths
/// * `executor_options` - Parallel-executor tuning (optional)
/// * `path` - The modules and nested paths, in execution order
///
/// # Example
/// ```yaml
/// processes: 4
/// max_events: 1000
/// executor_options:
///   window_factor: 4
/// path:
///   - module: EventInfoSetter
///     params: { evtNumList: [100] }
///   - module: EventInfoPrinter
///     name: printer
///     conditions:
///       - expression: "== 1"
///         after: continue
///         path:
///           - module: EventCounter
///   - path:
///       - module: EventCounter
///         name: counter
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub processes: usize,
    #[serde(default)]
    pub max_events: Option<u64>,
    #[serde(default = "default_max_branch_depth")]
    pub max_branch_depth: usize,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    pub path: Vec<PathElementConfig>,
}

fn default_max_branch_depth() -> usize {
    DEFAULT_MAX_BRANCH_DEPTH
}

/// Parallel-executor tuning. Every field falls back to a built-in default.
///
/// # Fields
/// * `window_factor` - Events in flight per worker; bounds the reorder buffer
/// * `ring_capacity` - Frames each ring buffer holds
/// * `poll_interval_ms` - How often blocked contexts check for abort
/// * `grace_period_ms` - Window in which a second interrupt forces shutdown
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExecutorOptions {
    pub window_factor: Option<usize>,
    pub ring_capacity: Option<usize>,
    pub poll_interval_ms: Option<u64>,
    pub grace_period_ms: Option<u64>,
}

impl ExecutorOptions {
    pub fn get_window_factor(&self) -> usize {
        self.window_factor.unwrap_or(DEFAULT_WINDOW_FACTOR)
    }

    pub fn get_ring_capacity(&self) -> usize {
        self.ring_capacity.unwrap_or(DEFAULT_RING_CAPACITY)
    }

    pub fn get_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn get_grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms.unwrap_or(DEFAULT_GRACE_PERIOD_MS))
    }
}

/// One element of a path: a module or a nested path spliced in place.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PathElementConfig {
    Module(ModuleConfig),
    Path(NestedPathConfig),
}

/// A module instance.
///
/// # Example
/// ```yaml
/// module: Modulo
/// name: odd_events
/// params: { divisor: 2 }
/// conditions:
///   - expression: "== 1"
///     path:
///       - module: EventInfoPrinter
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Registered module type
    pub module: String,
    /// Instance name; defaults to the type name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,
}

impl ModuleConfig {
    pub fn instance_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.module)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NestedPathConfig {
    pub path: Vec<PathElementConfig>,
}

/// A conditional sub-path of the module it is listed under.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConditionConfig {
    /// `<operator> <integer>`, a bare integer meaning `==`, or `true` / `false`
    #[serde(deserialize_with = "expression_text")]
    pub expression: String,
    #[serde(default)]
    pub after: AfterConditionPath,
    pub path: Vec<PathElementConfig>,
}

/// Unquoted `true`, `false` and integers are read as the expression text.
fn expression_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(text) => Ok(text),
        serde_yaml::Value::Bool(flag) => Ok(flag.to_string()),
        serde_yaml::Value::Number(number) => Ok(number.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a condition expression, found {:?}",
            other
        ))),
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a config from a YAML file and validate it against the module types of
/// `registry`.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
    registry: &ModuleRegistry,
) -> Result<Config, Box<dyn std::error::Error>> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_config(&cfg, registry) {
        let error_messages: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
        let combined_error = format!(
            "Configuration validation failed:\n{}",
            error_messages.join("\n")
        );
        return Err(combined_error.into());
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
processes: 2
path:
  - module: EventInfoSetter
    params:
      evtNumList: [10]
  - module: EventInfoPrinter
    name: printer
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.processes, 2);
        assert_eq!(cfg.max_events, None);
        assert_eq!(cfg.max_branch_depth, DEFAULT_MAX_BRANCH_DEPTH);
        assert_eq!(cfg.path.len(), 2);

        match &cfg.path[1] {
            PathElementConfig::Module(module) => {
                assert_eq!(module.module, "EventInfoPrinter");
                assert_eq!(module.instance_name(), "printer");
            }
            other => panic!("expected a module, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_paths_and_conditions() {
        let yaml = r#"
path:
  - module: Modulo
    conditions:
      - expression: "< 1"
        after: continue
        path:
          - module: EventInfoPrinter
      - expression: "2"
        path:
          - path:
              - module: EventCounter
  - path:
      - module: EventCounter
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let PathElementConfig::Module(modulo) = &cfg.path[0] else {
            panic!("expected a module");
        };
        assert_eq!(modulo.instance_name(), "Modulo");
        assert_eq!(modulo.conditions.len(), 2);
        assert_eq!(modulo.conditions[0].after, AfterConditionPath::Continue);
        assert_eq!(modulo.conditions[1].after, AfterConditionPath::End);
        assert!(matches!(
            modulo.conditions[1].path[0],
            PathElementConfig::Path(_)
        ));
        assert!(matches!(cfg.path[1], PathElementConfig::Path(_)));
    }

    #[test]
    fn test_condition_expression_forms() {
        let yaml = r#"
path:
  - module: Modulo
    conditions:
      - expression: true
        path: [{ module: EventInfoPrinter }]
      - expression: false
        path: [{ module: EventCounter }]
      - expression: 3
        path: [{ module: EventCounter, name: three }]
      - expression: ">= 4"
        path: [{ module: EventCounter, name: four }]
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let PathElementConfig::Module(modulo) = &cfg.path[0] else {
            panic!("expected a module");
        };
        let expressions: Vec<&str> = modulo
            .conditions
            .iter()
            .map(|c| c.expression.as_str())
            .collect();
        assert_eq!(expressions, vec!["true", "false", "3", ">= 4"]);

        let nested = "path:\n  - module: Modulo\n    conditions:\n      - expression: [1]\n        path: []";
        assert!(serde_yaml::from_str::<Config>(nested).is_err());
    }

    #[test]
    fn test_unknown_module_key_is_rejected() {
        let yaml = r#"
path:
  - module: EventCounter
    parameters: { x: 1 }
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_executor_option_defaults() {
        let yaml = r#"
executor_options:
  ring_capacity: 8
path: []
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let options = &cfg.executor_options;
        assert_eq!(options.get_ring_capacity(), 8);
        assert_eq!(options.get_window_factor(), DEFAULT_WINDOW_FACTOR);
        assert_eq!(
            options.get_poll_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
        assert_eq!(
            options.get_grace_period(),
            Duration::from_millis(DEFAULT_GRACE_PERIOD_MS)
        );
    }

    #[test]
    fn test_load_and_validate_valid_config() {
        let yaml = r#"
path:
  - module: EventInfoSetter
  - module: EventCounter
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let registry = ModuleRegistry::with_builtin_modules();
        let cfg = load_and_validate_config(file.path(), &registry).unwrap();
        assert_eq!(cfg.path.len(), 2);
    }

    #[test]
    fn test_load_and_validate_reports_every_error() {
        let yaml = r#"
path:
  - module: EventInfoSetter
    params:
      evtNumList: "ten"
  - module: NoSuchModule
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let registry = ModuleRegistry::with_builtin_modules();
        let error_msg = load_and_validate_config(file.path(), &registry)
            .unwrap_err()
            .to_string();
        assert!(error_msg.starts_with("Configuration validation failed:"));
        assert!(error_msg.contains("evtNumList"));
        assert!(error_msg.contains("Unknown module type: 'NoSuchModule'"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path().join("missing.yaml")).is_err());
    }
}
