use std::collections::BTreeMap;
use std::rc::Rc;

use cs_core::{OwnerRef, ParallelScriptSave, Program, ScriptError};
use cs_parser::parse_program;
use cs_runtime::{
    CommandRegistry, DebugHooks, ExecutorConfig, ProgramCache, ScriptExecutor,
    ScriptExecutorOptions, ScriptHost,
};

pub const DEFAULT_ENTRY_PROGRAM: &str = "main";

pub struct CreateExecutorOptions<A> {
    pub sources: BTreeMap<String, String>,
    pub entry_program: Option<String>,
    pub owner: Option<OwnerRef>,
    pub registry: CommandRegistry<A>,
    pub api: A,
    pub hooks: Option<Rc<dyn DebugHooks>>,
    pub config: ExecutorConfig,
    /// Parallel scripts from a save, scheduled before the entry runs.
    pub parallel_saves: Vec<ParallelScriptSave>,
}

pub fn parse_programs_from_source_map(
    sources: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, Program>, ScriptError> {
    sources
        .iter()
        .map(|(path, source)| parse_program(path, source).map(|program| (path.clone(), program)))
        .collect()
}

/// Parses every source up front so that syntax errors surface before any
/// program runs.
pub fn build_program_cache(
    sources: &BTreeMap<String, String>,
) -> Result<ProgramCache, ScriptError> {
    let mut cache = ProgramCache::new();
    for (path, program) in parse_programs_from_source_map(sources)? {
        cache.insert(path, program);
    }
    Ok(cache)
}

/// Cache that parses a program the first time it is loaded. Parse errors
/// then show up as load failures of that one program.
pub fn lazy_program_cache(sources: BTreeMap<String, String>) -> ProgramCache {
    ProgramCache::with_source(move |path| match sources.get(path) {
        Some(source) => parse_program(path, source),
        None => Err(ScriptError::new(
            "LOAD_NOT_FOUND",
            format!("No source registered for \"{}\".", path),
        )),
    })
}

/// Builds an executor over `sources` and runs the entry program (`main`
/// unless named) in the foreground.
pub fn create_executor_from_sources<A: ScriptHost>(
    options: CreateExecutorOptions<A>,
) -> Result<ScriptExecutor<A>, ScriptError> {
    let entry = resolve_entry_program(&options.sources, options.entry_program)?;
    let cache = build_program_cache(&options.sources)?;

    let mut executor = ScriptExecutor::new(ScriptExecutorOptions {
        registry: options.registry,
        api: options.api,
        loader: Box::new(cache),
        hooks: options.hooks,
        config: options.config,
    });

    if !options.parallel_saves.is_empty() {
        executor.restore_parallel(options.parallel_saves);
    }
    executor.run_path(&entry, options.owner)?;
    Ok(executor)
}

fn resolve_entry_program(
    sources: &BTreeMap<String, String>,
    explicit: Option<String>,
) -> Result<String, ScriptError> {
    if let Some(entry) = explicit {
        if !sources.contains_key(&entry) {
            return Err(ScriptError::new(
                "API_ENTRY_PROGRAM_NOT_FOUND",
                format!("Entry program \"{}\" is not registered.", entry),
            ));
        }
        return Ok(entry);
    }

    if sources.contains_key(DEFAULT_ENTRY_PROGRAM) {
        return Ok(DEFAULT_ENTRY_PROGRAM.to_string());
    }

    Err(ScriptError::new(
        "API_ENTRY_MAIN_NOT_FOUND",
        "Expected a program at path \"main\" as default entry.",
    ))
}
