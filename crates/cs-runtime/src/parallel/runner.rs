use std::rc::Rc;

use cs_core::{Opcode, OwnerRef, Program, ScriptError};
use tracing::{trace, warn};

use crate::completion::{CommandOutcome, Suspension};
use crate::context::{CommandContext, ScriptCursor, Session};
use crate::hooks::DebugHooks;
use crate::registry::{CommandCall, CommandRegistry, ScriptHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunnerStatus {
    Running,
    Finished,
}

/// Call-stack free run of one program with a single in-flight suspension
/// slot.
pub(crate) struct ParallelRunner<A> {
    program: Rc<Program>,
    line: usize,
    finished: bool,
    pending: Option<Suspension<A>>,
}

struct RunnerCursor<'a> {
    program: &'a Program,
    line: &'a mut usize,
    finished: &'a mut bool,
}

impl ScriptCursor for RunnerCursor<'_> {
    fn program_name(&self) -> &str {
        self.program.name()
    }

    fn owner(&self) -> Option<&OwnerRef> {
        None
    }

    fn goto_label(&mut self, label: &str) -> bool {
        let Some(index) = self.program.label_index(label) else {
            return false;
        };
        *self.line = index;
        true
    }

    fn end_script(&mut self) {
        *self.finished = true;
    }

    fn can_call(&self) -> bool {
        false
    }

    fn call(&mut self, program: Rc<Program>) {
        warn!(
            "Parallel \"{}\" cannot call \"{}\".",
            self.program.name(),
            program.name()
        );
    }
}

impl<A: ScriptHost> ParallelRunner<A> {
    pub(crate) fn new(program: Rc<Program>, hooks: Option<&dyn DebugHooks>) -> Self {
        if let Some(hooks) = hooks {
            hooks.on_script_start(program.name(), program.len(), &program.listing());
        }
        Self {
            program,
            line: 0,
            finished: false,
            pending: None,
        }
    }

    /// Advances the run for this frame. While the suspension slot is
    /// pending nothing moves; a pause yields until the next frame.
    pub(crate) fn resume_step(
        &mut self,
        registry: &CommandRegistry<A>,
        session: &mut Session<A>,
        hooks: Option<&dyn DebugHooks>,
        max_ops: usize,
    ) -> Result<RunnerStatus, ScriptError> {
        let program = Rc::clone(&self.program);
        let mut ops = 0usize;

        loop {
            if self.finished {
                self.pending = None;
                return Ok(RunnerStatus::Finished);
            }

            if let Some(suspension) = self.pending.take() {
                if !suspension.is_settled() {
                    self.pending = Some(suspension);
                    return Ok(RunnerStatus::Running);
                }

                let (value, then) = suspension.into_parts();
                if let Some(then) = then {
                    let mut cursor = RunnerCursor {
                        program: &program,
                        line: &mut self.line,
                        finished: &mut self.finished,
                    };
                    let mut context = CommandContext::new(session, &mut cursor);
                    let outcome = then(value, &mut context)?;
                    if self.apply_outcome(outcome) {
                        return Ok(self.status());
                    }
                }
                continue;
            }

            let Some(opcode) = program.opcode(self.line) else {
                self.finished = true;
                continue;
            };

            ops += 1;
            if ops > max_ops {
                return Err(ScriptError::at_line(
                    "EXECUTOR_STEP_GUARD",
                    format!(
                        "Parallel \"{}\" ran {} opcodes without yielding.",
                        program.name(),
                        max_ops
                    ),
                    opcode.source_line(),
                ));
            }

            if let Some(hooks) = hooks {
                hooks.on_line_executed(program.name(), self.line);
            }
            trace!("parallel {}:{} {}", program.name(), self.line, opcode);
            self.line += 1;

            let Opcode::Command(command) = opcode else {
                continue;
            };

            let Some(handler) = registry.get(&command.name) else {
                warn!(
                    "Unknown command \"{}\" at {}:{} skipped.",
                    command.name,
                    program.name(),
                    command.source_line
                );
                continue;
            };

            let call = CommandCall::from(command);
            let mut cursor = RunnerCursor {
                program: &program,
                line: &mut self.line,
                finished: &mut self.finished,
            };
            let mut context = CommandContext::new(session, &mut cursor);
            let outcome = handler(&call, &mut context)?;
            if self.apply_outcome(outcome) {
                return Ok(self.status());
            }
        }
    }

    /// Returns true when the runner has to yield for this frame.
    fn apply_outcome(&mut self, outcome: CommandOutcome<A>) -> bool {
        if self.finished {
            return true;
        }
        match outcome {
            CommandOutcome::Continue => false,
            CommandOutcome::Pause => true,
            CommandOutcome::Suspend(suspension) => {
                self.pending = Some(suspension);
                false
            }
        }
    }

    fn status(&self) -> RunnerStatus {
        if self.finished {
            RunnerStatus::Finished
        } else {
            RunnerStatus::Running
        }
    }
}
