use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use cs_core::{ScriptError, ScriptValue};

use crate::context::CommandContext;

/// Read side of a single-resolution slot. Cloning shares the slot.
#[derive(Clone, Default)]
pub struct Completion {
    slot: Rc<RefCell<Option<ScriptValue>>>,
}

/// Write side of a [`Completion`]. `settle` consumes it, so a slot can be
/// resolved at most once. It only holds the slot weakly: once every
/// `Completion` for it is gone (the run waiting on it was dropped) the
/// completer is abandoned and settling it does nothing.
pub struct Completer {
    slot: Weak<RefCell<Option<ScriptValue>>>,
}

impl Completion {
    pub fn pending() -> (Self, Completer) {
        let slot = Rc::new(RefCell::new(None));
        (
            Self {
                slot: Rc::clone(&slot),
            },
            Completer {
                slot: Rc::downgrade(&slot),
            },
        )
    }

    pub fn ready(value: ScriptValue) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(value))),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn value(&self) -> Option<ScriptValue> {
        self.slot.borrow().clone()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.slot.borrow() {
            Some(value) => write!(f, "Completion(settled: {:?})", value),
            None => f.write_str("Completion(pending)"),
        }
    }
}

impl Completer {
    /// True when nobody holds the matching `Completion` any more.
    pub fn is_abandoned(&self) -> bool {
        self.slot.strong_count() == 0
    }

    /// Returns false if the completer was abandoned.
    pub fn settle(self, value: ScriptValue) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        *slot.borrow_mut() = Some(value);
        true
    }
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completer")
    }
}

pub type CommandResult<A> = Result<CommandOutcome<A>, ScriptError>;

pub type Continuation<A> = Box<dyn FnOnce(ScriptValue, &mut CommandContext<'_, A>) -> CommandResult<A>>;

/// What the interpreter does after a command handler returns.
pub enum CommandOutcome<A> {
    /// Advance to the next line.
    Continue,
    /// Stop the loop until the host calls `resume`.
    Pause,
    /// Yield until the completion settles, then run the continuation (if
    /// any) and carry on.
    Suspend(Suspension<A>),
}

impl<A> From<Completion> for CommandOutcome<A> {
    fn from(completion: Completion) -> Self {
        Self::Suspend(Suspension::new(completion))
    }
}

impl<A> From<Suspension<A>> for CommandOutcome<A> {
    fn from(suspension: Suspension<A>) -> Self {
        Self::Suspend(suspension)
    }
}

impl<A> fmt::Debug for CommandOutcome<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Pause => f.write_str("Pause"),
            Self::Suspend(suspension) => f.debug_tuple("Suspend").field(suspension).finish(),
        }
    }
}

pub struct Suspension<A> {
    completion: Completion,
    then: Option<Continuation<A>>,
}

impl<A> Suspension<A> {
    pub fn new(completion: Completion) -> Self {
        Self {
            completion,
            then: None,
        }
    }

    /// Runs `continuation` with the settled value before the interpreter
    /// moves on. Replaces any continuation set earlier.
    pub fn then<F>(mut self, continuation: F) -> Self
    where
        F: FnOnce(ScriptValue, &mut CommandContext<'_, A>) -> CommandResult<A> + 'static,
    {
        self.then = Some(Box::new(continuation));
        self
    }

    pub fn is_settled(&self) -> bool {
        self.completion.is_settled()
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub(crate) fn into_parts(self) -> (ScriptValue, Option<Continuation<A>>) {
        (self.completion.value().unwrap_or_default(), self.then)
    }
}

impl<A> fmt::Debug for Suspension<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspension")
            .field("completion", &self.completion)
            .field("has_continuation", &self.then.is_some())
            .finish()
    }
}
