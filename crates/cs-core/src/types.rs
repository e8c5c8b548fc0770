use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::label::normalize_label;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInvocation {
    pub name: String,
    pub parameters: Vec<String>,
    pub result_token: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Opcode {
    Label { name: String, source_line: usize },
    Command(CommandInvocation),
}

impl Opcode {
    pub fn source_line(&self) -> usize {
        match self {
            Self::Label { source_line, .. } => *source_line,
            Self::Command(command) => command.source_line,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label { name, .. } => f.write_str(&normalize_label(name)),
            Self::Command(command) => {
                write!(f, "{}({})", command.name, command.parameters.join(", "))?;
                if !command.result_token.is_empty() {
                    write!(f, " {}", command.result_token)?;
                }
                Ok(())
            }
        }
    }
}

/// A parsed script. Immutable after construction so one instance can back
/// the foreground run, call-stack frames and parallel runs at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    name: String,
    opcodes: Vec<Opcode>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Builds the label index from the label markers. When a label is
    /// declared twice the first declaration wins.
    pub fn new(name: impl Into<String>, opcodes: Vec<Opcode>) -> Self {
        let mut labels = HashMap::new();
        for (index, opcode) in opcodes.iter().enumerate() {
            if let Opcode::Label { name, .. } = opcode {
                labels.entry(normalize_label(name)).or_insert(index);
            }
        }
        Self {
            name: name.into(),
            opcodes,
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opcodes(&self) -> &[Opcode] {
        &self.opcodes
    }

    pub fn opcode(&self, index: usize) -> Option<&Opcode> {
        self.opcodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(&normalize_label(label)).copied()
    }

    pub fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    pub fn listing(&self) -> Vec<String> {
        self.opcodes.iter().map(ToString::to_string).collect()
    }
}

/// The game entity that triggered a run, for commands acting on "the
/// object that called me".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub id: String,
}

impl OwnerRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelScriptSave {
    pub program_path: String,
    pub remaining_delay_ms: f64,
}
