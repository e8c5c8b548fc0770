use std::rc::Rc;

use cs_core::{OwnerRef, Program};

use crate::completion::Suspension;
use crate::context::ScriptCursor;
use crate::hooks::DebugHooks;

/// A caller saved on the call stack while a sub-program runs. Besides the
/// resume line it keeps everything that belonged to the caller's position,
/// so a caller that was paused or suspended when it got pushed is paused or
/// suspended again after the callee returns.
pub(crate) struct CallFrame<A> {
    pub(crate) program: Rc<Program>,
    pub(crate) return_line: usize,
    pub(crate) owner: Option<OwnerRef>,
    pub(crate) paused: bool,
    pub(crate) pending: Option<Suspension<A>>,
}

pub(crate) struct ExecutionState<A> {
    pub(crate) program: Option<Rc<Program>>,
    pub(crate) line: usize,
    pub(crate) running: bool,
    pub(crate) paused: bool,
    pub(crate) call_stack: Vec<CallFrame<A>>,
    pub(crate) owner: Option<OwnerRef>,
    pub(crate) pending: Option<Suspension<A>>,
}

impl<A> Default for ExecutionState<A> {
    fn default() -> Self {
        Self {
            program: None,
            line: 0,
            running: false,
            paused: false,
            call_stack: Vec::new(),
            owner: None,
            pending: None,
        }
    }
}

impl<A> ExecutionState<A> {
    /// Makes `program` current at line 0. An active program is pushed as a
    /// caller; a missing `owner` inherits the caller's.
    pub(crate) fn begin(
        &mut self,
        program: Rc<Program>,
        owner: Option<OwnerRef>,
        hooks: Option<&dyn DebugHooks>,
    ) {
        let owner = owner.or_else(|| self.owner.clone());
        if let Some(caller) = self.program.take() {
            self.call_stack.push(CallFrame {
                program: caller,
                return_line: self.line,
                owner: self.owner.take(),
                paused: self.paused,
                pending: self.pending.take(),
            });
        }

        if let Some(hooks) = hooks {
            hooks.on_script_start(program.name(), program.len(), &program.listing());
        }

        self.program = Some(program);
        self.line = 0;
        self.owner = owner;
        self.running = true;
        self.paused = false;
    }

    /// Returns to the caller if there is one, otherwise stops. Returns true
    /// when a caller was resumed.
    pub(crate) fn finish_program(&mut self) -> bool {
        if let Some(frame) = self.call_stack.pop() {
            self.program = Some(frame.program);
            self.line = frame.return_line;
            self.owner = frame.owner;
            self.paused = frame.paused;
            self.pending = frame.pending;
            return true;
        }

        self.program = None;
        self.line = 0;
        self.owner = None;
        self.running = false;
        self.paused = false;
        self.pending = None;
        false
    }

    pub(crate) fn goto_label(&mut self, label: &str) -> bool {
        let Some(index) = self
            .program
            .as_ref()
            .and_then(|program| program.label_index(label))
        else {
            return false;
        };
        self.line = index;
        true
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

pub(crate) struct ForegroundCursor<'a, A> {
    pub(crate) state: &'a mut ExecutionState<A>,
    pub(crate) hooks: Option<&'a dyn DebugHooks>,
}

impl<A> ScriptCursor for ForegroundCursor<'_, A> {
    fn program_name(&self) -> &str {
        self.state
            .program
            .as_ref()
            .map(|program| program.name())
            .unwrap_or("")
    }

    fn owner(&self) -> Option<&OwnerRef> {
        self.state.owner.as_ref()
    }

    fn goto_label(&mut self, label: &str) -> bool {
        self.state.goto_label(label)
    }

    fn end_script(&mut self) {
        self.state.finish_program();
    }

    fn can_call(&self) -> bool {
        true
    }

    fn call(&mut self, program: Rc<Program>) {
        self.state.begin(program, None, self.hooks);
    }
}
