//! Frame-driven interpreter for cutscene, dialogue and quest scripts.
//!
//! A [`ScriptExecutor`] runs one foreground program at a time, with
//! call/return between programs, a FIFO of triggered programs and any
//! number of parallel programs. Command handlers come from a
//! [`CommandRegistry`]; a handler that has to wait across frames returns a
//! [`Suspension`] built from a [`Completion`] handed out by the
//! [`BlockingResolver`], and the interpreter picks the run up again once the
//! host's `update` or `resolve_named` settles it.

mod completion;
mod config;
mod context;
mod executor;
mod hooks;
mod loader;
mod parallel;
mod registry;
mod resolver;

#[cfg(test)]
mod test_support;

pub use completion::{
    CommandOutcome, CommandResult, Completer, Completion, Continuation, Suspension,
};
pub use config::{ExecutorConfig, DEFAULT_MAX_OPS_PER_STEP};
pub use context::{CommandContext, QueuedScript};
pub use executor::{ScriptExecutor, ScriptExecutorOptions};
pub use hooks::DebugHooks;
pub use loader::{ProgramCache, ProgramLoader, ProgramSource};
pub use parallel::ParallelScheduler;
pub use registry::{CommandCall, CommandHandler, CommandRegistry, ScriptHost};
pub use resolver::{BlockingResolver, PollPredicate};
