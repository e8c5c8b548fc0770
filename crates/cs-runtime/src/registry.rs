use std::collections::HashMap;
use std::rc::Rc;

use cs_core::{CommandInvocation, ScriptValue};

use crate::completion::CommandResult;
use crate::context::CommandContext;

/// The game-specific side-effect API handed to command handlers.
pub trait ScriptHost {
    /// Backs `$name` substitution in command parameters.
    fn variable(&self, _name: &str) -> Option<ScriptValue> {
        None
    }
}

impl ScriptHost for () {}

/// One command line as seen by its handler.
#[derive(Debug, Clone, Copy)]
pub struct CommandCall<'a> {
    pub name: &'a str,
    pub parameters: &'a [String],
    pub result_token: &'a str,
    pub source_line: usize,
}

impl<'a> CommandCall<'a> {
    pub fn param(&self, index: usize) -> Option<&'a str> {
        self.parameters.get(index).map(String::as_str)
    }

    pub fn has_result_token(&self) -> bool {
        !self.result_token.trim().is_empty()
    }
}

impl<'a> From<&'a CommandInvocation> for CommandCall<'a> {
    fn from(command: &'a CommandInvocation) -> Self {
        Self {
            name: &command.name,
            parameters: &command.parameters,
            result_token: &command.result_token,
            source_line: command.source_line,
        }
    }
}

pub type CommandHandler<A> = Rc<dyn Fn(&CommandCall<'_>, &mut CommandContext<'_, A>) -> CommandResult<A>>;

/// Case-insensitive command name to handler table.
pub struct CommandRegistry<A> {
    handlers: HashMap<String, CommandHandler<A>>,
}

impl<A> Default for CommandRegistry<A> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<A> Clone for CommandRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<A> CommandRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering the same name twice replaces the earlier handler.
    pub fn register<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&CommandCall<'_>, &mut CommandContext<'_, A>) -> CommandResult<A> + 'static,
    {
        self.handlers.insert(name.to_lowercase(), Rc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<CommandHandler<A>> {
        self.handlers.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.handlers.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
