use std::ffi::OsString;
use std::fs;

use clap::Parser;
use cs_api::{create_executor_from_sources, parse_programs_from_source_map, CreateExecutorOptions};
use cs_core::{ParallelScriptSave, ScriptError};
use cs_runtime::ExecutorConfig;
use tracing::Level;

mod cli_args;
#[cfg(test)]
mod cli_test_support;
mod demo_commands;
mod error_map;
mod models;
mod player;
mod source_loader;

pub(crate) use cli_args::{CheckArgs, Cli, Mode, PlayArgs};
pub(crate) use demo_commands::{demo_registry, DemoHost};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_config_invalid, map_cli_config_read,
    map_cli_snapshot_invalid, map_cli_snapshot_read, map_cli_snapshot_write,
    map_cli_source_path, map_cli_source_read, map_cli_source_scan,
};
pub(crate) use models::{LoadedScenario, PlayOptions, PlayReport, PlayState, SCRIPT_EXTENSION};
pub(crate) use player::{emit_report, parse_event_value, play};
pub(crate) use source_loader::{load_scenario, read_scripts_from_dir, resolve_scripts_dir};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // A subscriber may already be installed when called more than once in
    // one process.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, ScriptError> {
    match cli.command {
        Mode::Play(args) => run_play(args),
        Mode::Check(args) => run_check(args),
    }
}

fn read_config(path: Option<&str>) -> Result<ExecutorConfig, ScriptError> {
    let Some(path) = path else {
        return Ok(ExecutorConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(map_cli_config_read)?;
    serde_json::from_str(&raw).map_err(map_cli_config_invalid)
}

fn read_parallel_saves(path: Option<&str>) -> Result<Vec<ParallelScriptSave>, ScriptError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = fs::read_to_string(path).map_err(map_cli_snapshot_read)?;
    serde_json::from_str(&raw).map_err(map_cli_snapshot_invalid)
}

fn write_parallel_saves(path: &str, saves: &[ParallelScriptSave]) -> Result<(), ScriptError> {
    let raw = serde_json::to_string_pretty(saves).map_err(map_cli_snapshot_invalid)?;
    fs::write(path, raw).map_err(map_cli_snapshot_write)
}

fn run_play(args: PlayArgs) -> Result<i32, ScriptError> {
    let entry_program = args.entry.unwrap_or_else(|| "main".to_string());
    let scenario = load_scenario(&args.scripts_dir, &entry_program)?;
    tracing::debug!("Playing {}", scenario.id);

    let mut executor = create_executor_from_sources(CreateExecutorOptions {
        sources: scenario.sources,
        entry_program: Some(scenario.entry_program),
        owner: None,
        registry: demo_registry(),
        api: DemoHost::default(),
        hooks: None,
        config: read_config(args.config.as_deref())?,
        parallel_saves: read_parallel_saves(args.parallel_in.as_deref())?,
    })?;

    let report = play(
        &mut executor,
        PlayOptions {
            frames: args.frames,
            frame_ms: args.frame_ms,
            events: args
                .events
                .iter()
                .map(|(name, raw)| (name.clone(), parse_event_value(raw)))
                .collect(),
        },
    )?;

    if let Some(path) = args.parallel_out.as_deref() {
        write_parallel_saves(path, &executor.parallel_snapshot())?;
    }

    emit_report(&report);
    Ok(0)
}

fn run_check(args: CheckArgs) -> Result<i32, ScriptError> {
    let root = resolve_scripts_dir(&args.scripts_dir)?;
    let sources = read_scripts_from_dir(&root)?;
    let programs = parse_programs_from_source_map(&sources)?;

    println!("RESULT:OK");
    println!("PROGRAMS:{}", programs.len());
    for (path, program) in &programs {
        println!(
            "PROGRAM:{} opcodes={} labels={}",
            path,
            program.len(),
            program.labels().len()
        );
    }
    Ok(0)
}
