use std::collections::HashMap;
use std::rc::Rc;

use cs_core::{Program, ScriptError};
use tracing::debug;

pub trait ProgramLoader {
    fn load(&mut self, path: &str) -> Result<Rc<Program>, ScriptError>;
}

pub type ProgramSource = Box<dyn FnMut(&str) -> Result<Program, ScriptError>>;

/// Path-keyed cache of parsed programs. On a miss the optional source
/// callback is asked to produce the program, which is then cached.
#[derive(Default)]
pub struct ProgramCache {
    programs: HashMap<String, Rc<Program>>,
    source: Option<ProgramSource>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source<F>(source: F) -> Self
    where
        F: FnMut(&str) -> Result<Program, ScriptError> + 'static,
    {
        Self {
            programs: HashMap::new(),
            source: Some(Box::new(source)),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, program: Program) -> Rc<Program> {
        let program = Rc::new(program);
        self.programs.insert(path.into(), Rc::clone(&program));
        program
    }

    pub fn get(&self, path: &str) -> Option<Rc<Program>> {
        self.programs.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.programs.contains_key(path)
    }

    /// Runs still holding the program keep their reference.
    pub fn evict(&mut self, path: &str) -> bool {
        self.programs.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.programs.clear();
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl ProgramLoader for ProgramCache {
    fn load(&mut self, path: &str) -> Result<Rc<Program>, ScriptError> {
        if let Some(program) = self.programs.get(path) {
            return Ok(Rc::clone(program));
        }

        let Some(source) = self.source.as_mut() else {
            return Err(ScriptError::new(
                "LOAD_NOT_FOUND",
                format!("Program \"{}\" is not loaded.", path),
            ));
        };

        let program = source(path)?;
        debug!("Cached program \"{}\" ({} lines).", path, program.len());
        Ok(self.insert(path, program))
    }
}
