use cs_core::{Opcode, ScriptError};
use tracing::{debug, trace, warn};

use super::{ForegroundCursor, ScriptExecutor};
use crate::completion::CommandOutcome;
use crate::context::CommandContext;
use crate::registry::{CommandCall, ScriptHost};

impl<A: ScriptHost> ScriptExecutor<A> {
    /// The interpreter loop. Runs opcodes until the foreground stops, pauses
    /// or waits on a suspension that has not settled yet.
    pub(super) fn step(&mut self) -> Result<(), ScriptError> {
        let mut ops = 0usize;
        loop {
            if !self.state.running || self.state.paused {
                return Ok(());
            }

            if let Some(suspension) = self.state.pending.take() {
                if !suspension.is_settled() {
                    self.state.pending = Some(suspension);
                    return Ok(());
                }

                let (value, then) = suspension.into_parts();
                if let Some(then) = then {
                    let hooks = self.hooks.clone();
                    let mut cursor = ForegroundCursor {
                        state: &mut self.state,
                        hooks: hooks.as_deref(),
                    };
                    let mut context = CommandContext::new(&mut self.session, &mut cursor);
                    let outcome = then(value, &mut context)?;
                    self.apply_outcome(outcome);
                }
                continue;
            }

            let Some(program) = self.state.program.clone() else {
                self.state.running = false;
                return Ok(());
            };

            let line = self.state.line;
            let Some(opcode) = program.opcode(line) else {
                if self.state.finish_program() {
                    debug!("\"{}\" ended; returning to caller.", program.name());
                } else {
                    debug!("\"{}\" ended.", program.name());
                }
                continue;
            };

            ops += 1;
            if ops > self.config.max_ops_per_step {
                return Err(ScriptError::at_line(
                    "EXECUTOR_STEP_GUARD",
                    format!(
                        "\"{}\" ran {} opcodes without yielding.",
                        program.name(),
                        self.config.max_ops_per_step
                    ),
                    opcode.source_line(),
                ));
            }

            if let Some(hooks) = &self.hooks {
                hooks.on_line_executed(program.name(), line);
            }
            trace!("{}:{} {}", program.name(), line, opcode);
            self.state.line = line + 1;

            let Opcode::Command(command) = opcode else {
                continue;
            };

            let Some(handler) = self.registry.get(&command.name) else {
                warn!(
                    "Unknown command \"{}\" at {}:{} skipped.",
                    command.name,
                    program.name(),
                    command.source_line
                );
                continue;
            };

            let call = CommandCall::from(command);
            let hooks = self.hooks.clone();
            let mut cursor = ForegroundCursor {
                state: &mut self.state,
                hooks: hooks.as_deref(),
            };
            let mut context = CommandContext::new(&mut self.session, &mut cursor);
            let outcome = handler(&call, &mut context)?;
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: CommandOutcome<A>) {
        if !self.state.running {
            return;
        }
        match outcome {
            CommandOutcome::Continue => {}
            CommandOutcome::Pause => {
                debug!(
                    "Paused at {}:{}.",
                    self.current_program_name().unwrap_or(""),
                    self.state.line
                );
                self.state.paused = true;
            }
            CommandOutcome::Suspend(suspension) => {
                self.state.pending = Some(suspension);
            }
        }
    }
}
