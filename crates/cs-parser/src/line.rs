use std::sync::OnceLock;

use cs_core::{CommandInvocation, Opcode, Program, ScriptError};
use regex::Regex;

fn label_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(?:@[A-Za-z0-9_.\-]+:?|[A-Za-z0-9_.\-]+:)$").expect("label regex must compile")
    })
}

fn command_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*([^\s;]*)\s*;?$")
            .expect("command regex must compile")
    })
}

/// Parses the line-oriented script format:
///
/// ```text
/// // comment
/// @Start:
/// Say("Hello, there", $name)
/// IfVar($gold, 10) @Rich
/// Return
/// ```
pub fn parse_program(name: &str, source: &str) -> Result<Program, ScriptError> {
    let mut opcodes = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let source_line = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }

        if label_regex().is_match(line) {
            opcodes.push(Opcode::Label {
                name: line.to_string(),
                source_line,
            });
            continue;
        }

        let Some(caps) = command_regex().captures(line) else {
            return Err(ScriptError::at_line(
                "PARSE_INVALID_LINE",
                format!("{}:{}: cannot parse \"{}\".", name, source_line, line),
                source_line,
            ));
        };

        let parameters = match caps.get(2) {
            Some(args) => split_arguments(args.as_str()).map_err(|message| {
                ScriptError::at_line(
                    "PARSE_UNCLOSED_QUOTE",
                    format!("{}:{}: {}", name, source_line, message),
                    source_line,
                )
            })?,
            None => Vec::new(),
        };

        opcodes.push(Opcode::Command(CommandInvocation {
            name: caps[1].to_string(),
            parameters,
            result_token: caps
                .get(3)
                .map(|token| token.as_str().to_string())
                .unwrap_or_default(),
            source_line,
        }));
    }

    Ok(Program::new(name, opcodes))
}

/// Splits a parenthesised argument list on commas outside double quotes.
/// Quotes are removed and unquoted arguments are trimmed.
pub fn split_arguments(raw: &str) -> Result<Vec<String>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut quoted_text: Option<String> = None;
    let mut quoted = false;

    for ch in raw.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                quoted_text.get_or_insert_with(String::new);
            }
            ',' if !quoted => {
                arguments.push(finish_argument(&current, quoted_text.take()));
                current.clear();
            }
            _ if quoted => {
                if let Some(text) = quoted_text.as_mut() {
                    text.push(ch);
                }
            }
            _ => current.push(ch),
        }
    }

    if quoted {
        return Err("unclosed quote in argument list.".to_string());
    }
    arguments.push(finish_argument(&current, quoted_text));
    Ok(arguments)
}

// text outside the quotes of a quoted argument is padding and is dropped
fn finish_argument(unquoted: &str, quoted: Option<String>) -> String {
    quoted.unwrap_or_else(|| unquoted.trim().to_string())
}
