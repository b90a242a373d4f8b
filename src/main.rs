// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context};
use std::env;
use std::sync::Arc;
use std::time::Instant;
use the_pathway::config::{load_and_validate_config, RuntimeBuilder};
use the_pathway::errors::ExitStatus;
use the_pathway::observability::messages::{validation::ConfigLoaded, StructuredLog};
use the_pathway::registry::ModuleRegistry;
use tracing_subscriber::EnvFilter;

enum Command {
    Run {
        steering: String,
        processes: Option<usize>,
        max_events: Option<u64>,
    },
    ListModules,
    ModuleInfo(String),
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {0} <steering.yaml> [--processes N] [--max-events N]\n       {0} --modules\n       {0} --module-info <Type>",
        program
    )
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut rest = args.iter().skip(1);
    let mut steering = None;
    let mut processes = None;
    let mut max_events = None;

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--modules" => return Ok(Command::ListModules),
            "--module-info" => {
                let type_name = rest.next().ok_or_else(|| anyhow!("--module-info needs a module type"))?;
                return Ok(Command::ModuleInfo(type_name.clone()));
            }
            "--processes" => {
                let value = rest.next().ok_or_else(|| anyhow!("--processes needs a value"))?;
                processes = Some(value.parse().with_context(|| format!("invalid --processes '{}'", value))?);
            }
            "--max-events" => {
                let value = rest.next().ok_or_else(|| anyhow!("--max-events needs a value"))?;
                max_events = Some(value.parse().with_context(|| format!("invalid --max-events '{}'", value))?);
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            file if steering.is_none() => steering = Some(file.to_string()),
            extra => bail!("unexpected argument '{}'", extra),
        }
    }

    let steering = steering.ok_or_else(|| anyhow!("no steering file given"))?;
    Ok(Command::Run {
        steering,
        processes,
        max_events,
    })
}

fn list_modules(registry: &ModuleRegistry) {
    println!("Available modules:");
    for type_name in registry.list_available() {
        println!(
            "  {:<20} {}",
            type_name,
            registry.description(type_name).unwrap_or_default()
        );
    }
}

fn module_info(registry: &ModuleRegistry, type_name: &str) -> anyhow::Result<()> {
    let params = registry.param_info(type_name)?;
    let properties = registry.properties(type_name)?;

    println!("Module: {}", type_name);
    if let Some(description) = registry.description(type_name) {
        println!("  {}", description);
    }
    println!(
        "Properties: parallel-safe={} input={} output={}",
        properties.parallel_safe, properties.input, properties.output
    );
    if params.is_empty() {
        println!("Parameters: none");
    } else {
        println!("Parameters:");
        for param in params {
            println!("  {}", param);
        }
    }
    Ok(())
}

async fn run(
    registry: Arc<ModuleRegistry>,
    steering: &str,
    processes: Option<usize>,
    max_events: Option<u64>,
) -> Result<(), (ExitStatus, String)> {
    let configuration_error = |e: Box<dyn std::error::Error>| (ExitStatus::Configuration, e.to_string());

    let mut config = load_and_validate_config(steering, &registry).map_err(configuration_error)?;
    if let Some(processes) = processes {
        config.processes = processes;
    }
    if max_events.is_some() {
        config.max_events = max_events;
    }
    ConfigLoaded {
        source: steering,
        modules: config.path.len(),
        processes: config.processes,
    }
    .log();

    let (path, executor) = RuntimeBuilder::from_config(&config, registry)
        .map_err(|e| (e.exit_code(), e.to_string()))?;

    let started = Instant::now();
    let summary = executor
        .process(path)
        .await
        .map_err(|e| (e.exit_code(), e.to_string()))?;

    println!("{}", summary.statistics);
    println!(
        "Processed {} events ({} skipped) in {} mode in {:?}",
        summary.events_processed,
        summary.events_skipped,
        summary.mode,
        started.elapsed()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("the-pathway");

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n{}", e, usage(program));
            std::process::exit(ExitStatus::Configuration.code());
        }
    };

    let registry = Arc::new(ModuleRegistry::with_builtin_modules());
    let status = match command {
        Command::ListModules => {
            list_modules(&registry);
            ExitStatus::Success
        }
        Command::ModuleInfo(type_name) => match module_info(&registry, &type_name) {
            Ok(()) => ExitStatus::Success,
            Err(e) => {
                eprintln!("{}", e);
                ExitStatus::Configuration
            }
        },
        Command::Run {
            steering,
            processes,
            max_events,
        } => match run(registry, &steering, processes, max_events).await {
            Ok(()) => ExitStatus::Success,
            Err((status, message)) => {
                eprintln!("Job failed: {}", message);
                status
            }
        },
    };

    std::process::exit(status.code());
}
