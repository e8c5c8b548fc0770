use cs_core::ScriptError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> ScriptError {
    ScriptError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ScriptError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    if let Some(line) = error.line {
        println!("ERROR_LINE:{}", line);
    }
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    1
}

pub(crate) fn json_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> ScriptError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> ScriptError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_config_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_CONFIG_READ", error)
}

pub(crate) fn map_cli_config_invalid(error: serde_json::Error) -> ScriptError {
    map_error("CLI_CONFIG_INVALID", error)
}

pub(crate) fn map_cli_snapshot_read(error: std::io::Error) -> ScriptError {
    map_error("CLI_SNAPSHOT_READ", error)
}

pub(crate) fn map_cli_snapshot_invalid(error: serde_json::Error) -> ScriptError {
    map_error("CLI_SNAPSHOT_INVALID", error)
}

pub(crate) fn map_cli_snapshot_write(error: std::io::Error) -> ScriptError {
    map_error("CLI_SNAPSHOT_WRITE", error)
}
