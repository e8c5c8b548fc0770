use cs_core::{ParallelScriptSave, ScriptError};
use tracing::{debug, warn};

use crate::context::Session;
use crate::hooks::DebugHooks;
use crate::registry::{CommandRegistry, ScriptHost};

mod runner;

pub(crate) use runner::RunnerStatus;
pub(crate) use runner::ParallelRunner;

pub(crate) struct ParallelItem<A> {
    program_path: String,
    remaining_delay_ms: f64,
    runner: Option<ParallelRunner<A>>,
}

impl<A> ParallelItem<A> {
    fn new(program_path: &str, remaining_delay_ms: f64) -> Self {
        Self {
            program_path: program_path.to_string(),
            remaining_delay_ms: remaining_delay_ms.max(0.0),
            runner: None,
        }
    }
}

/// Background scripts that progress alongside the foreground program.
/// Items scheduled with a positive delay count down in `delayed` before
/// their runner starts; everything else lives in `immediate`.
pub struct ParallelScheduler<A> {
    delayed: Vec<ParallelItem<A>>,
    immediate: Vec<ParallelItem<A>>,
}

impl<A> Default for ParallelScheduler<A> {
    fn default() -> Self {
        Self {
            delayed: Vec::new(),
            immediate: Vec::new(),
        }
    }
}

impl<A> ParallelScheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, program_path: &str, delay_ms: f64) {
        let item = ParallelItem::new(program_path, delay_ms);
        if item.remaining_delay_ms > 0.0 {
            debug!(
                "Parallel \"{}\" scheduled in {}ms.",
                program_path, item.remaining_delay_ms
            );
            self.delayed.push(item);
        } else {
            debug!("Parallel \"{}\" scheduled.", program_path);
            self.immediate.push(item);
        }
    }

    /// Started delayed items report their exhausted countdown (0).
    pub fn snapshot(&self) -> Vec<ParallelScriptSave> {
        self.delayed
            .iter()
            .map(|item| ParallelScriptSave {
                program_path: item.program_path.clone(),
                remaining_delay_ms: item.remaining_delay_ms,
            })
            .chain(self.immediate.iter().map(|item| ParallelScriptSave {
                program_path: item.program_path.clone(),
                remaining_delay_ms: 0.0,
            }))
            .collect()
    }

    pub fn restore(&mut self, saves: Vec<ParallelScriptSave>) {
        self.clear();
        for save in saves {
            self.add(&save.program_path, save.remaining_delay_ms);
        }
    }

    pub fn clear(&mut self) {
        self.delayed.clear();
        self.immediate.clear();
    }

    pub fn len(&self) -> usize {
        self.delayed.len() + self.immediate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delayed.is_empty() && self.immediate.is_empty()
    }

    pub fn delayed_len(&self) -> usize {
        self.delayed.len()
    }

    pub fn immediate_len(&self) -> usize {
        self.immediate.len()
    }

    /// Number of items whose runner has started.
    pub fn active_len(&self) -> usize {
        self.delayed
            .iter()
            .chain(self.immediate.iter())
            .filter(|item| item.runner.is_some())
            .count()
    }
}

impl<A: ScriptHost> ParallelScheduler<A> {
    /// Counts delayed items down by `delta_ms`, starts every item whose
    /// countdown is over and steps each started runner once. Finished items
    /// are removed. Commands cannot add items while this runs; their
    /// requests join after it returns.
    pub(crate) fn step(
        &mut self,
        delta_ms: f64,
        registry: &CommandRegistry<A>,
        session: &mut Session<A>,
        hooks: Option<&dyn DebugHooks>,
        max_ops: usize,
    ) -> Result<(), ScriptError> {
        for item in self.delayed.iter_mut().filter(|item| item.runner.is_none()) {
            item.remaining_delay_ms = (item.remaining_delay_ms - delta_ms).max(0.0);
        }

        advance_items(&mut self.delayed, registry, session, hooks, max_ops)?;
        advance_items(&mut self.immediate, registry, session, hooks, max_ops)
    }
}

fn advance_items<A: ScriptHost>(
    items: &mut Vec<ParallelItem<A>>,
    registry: &CommandRegistry<A>,
    session: &mut Session<A>,
    hooks: Option<&dyn DebugHooks>,
    max_ops: usize,
) -> Result<(), ScriptError> {
    let mut index = 0usize;
    while index < items.len() {
        let item = &mut items[index];

        if item.runner.is_none() {
            if item.remaining_delay_ms > 0.0 {
                index += 1;
                continue;
            }
            match session.loader.load(&item.program_path) {
                Ok(program) => item.runner = Some(ParallelRunner::new(program, hooks)),
                Err(error) => {
                    warn!(
                        "Failed to load parallel \"{}\": {}",
                        item.program_path, error
                    );
                    items.remove(index);
                    continue;
                }
            }
        }

        let status = match item.runner.as_mut() {
            Some(runner) => runner.resume_step(registry, session, hooks, max_ops)?,
            None => RunnerStatus::Finished,
        };

        if status == RunnerStatus::Finished {
            debug!("Parallel \"{}\" finished.", item.program_path);
            items.remove(index);
        } else {
            index += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
