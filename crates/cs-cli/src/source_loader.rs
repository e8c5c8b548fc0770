use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cs_core::ScriptError;
use walkdir::WalkDir;

use crate::{
    map_cli_source_path, map_cli_source_read, map_cli_source_scan, LoadedScenario,
    SCRIPT_EXTENSION,
};

pub(crate) fn load_scenario(
    scripts_dir: &str,
    entry_program: &str,
) -> Result<LoadedScenario, ScriptError> {
    let scripts_root = resolve_scripts_dir(scripts_dir)?;
    let sources = read_scripts_from_dir(&scripts_root)?;

    Ok(LoadedScenario {
        id: format!("scripts-dir:{}", scripts_root.display()),
        sources,
        entry_program: entry_program.to_string(),
    })
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, ScriptError> {
    let path = PathBuf::from(scripts_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Maps every `*.script` file below `scripts_dir` to its program path: the
/// relative path with `/` separators and without the extension.
pub(crate) fn read_scripts_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, ScriptError> {
    let mut scripts = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");
        let Some(program_path) = relative.strip_suffix(SCRIPT_EXTENSION) else {
            continue;
        };

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        scripts.insert(program_path.to_string(), content);
    }

    if scripts.is_empty() {
        return Err(ScriptError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .script files under {}", scripts_dir.display()),
        ));
    }

    Ok(scripts)
}
