use std::rc::Rc;

use cs_core::{OwnerRef, Program, ScriptValue};
use tracing::{debug, warn};

use crate::completion::Completion;
use crate::loader::ProgramLoader;
use crate::registry::ScriptHost;
use crate::resolver::BlockingResolver;

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedScript {
    pub path: String,
    pub owner: Option<OwnerRef>,
}

/// Work a handler asked for that the executor applies once the current
/// step returns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScriptRequest {
    Enqueue(QueuedScript),
    Parallel { path: String, delay_ms: f64 },
}

/// Services shared by every run: the side-effect API, the resolver, the
/// program loader, the clock and the buffer of deferred requests.
pub(crate) struct Session<A> {
    pub(crate) api: A,
    pub(crate) resolver: BlockingResolver<A>,
    pub(crate) loader: Box<dyn ProgramLoader>,
    pub(crate) requests: Vec<ScriptRequest>,
    pub(crate) now_ms: f64,
}

impl<A> Session<A> {
    pub(crate) fn new(api: A, loader: Box<dyn ProgramLoader>) -> Self {
        Self {
            api,
            resolver: BlockingResolver::new(),
            loader,
            requests: Vec::new(),
            now_ms: 0.0,
        }
    }
}

/// Position control a handler has over the run that invoked it.
pub(crate) trait ScriptCursor {
    fn program_name(&self) -> &str;

    fn owner(&self) -> Option<&OwnerRef>;

    fn goto_label(&mut self, label: &str) -> bool;

    fn end_script(&mut self);

    fn can_call(&self) -> bool;

    fn call(&mut self, program: Rc<Program>);
}

/// Helpers handed to a command handler (and to its continuation).
pub struct CommandContext<'a, A> {
    session: &'a mut Session<A>,
    cursor: &'a mut dyn ScriptCursor,
}

impl<'a, A> CommandContext<'a, A> {
    pub(crate) fn new(session: &'a mut Session<A>, cursor: &'a mut dyn ScriptCursor) -> Self {
        Self { session, cursor }
    }

    pub fn api(&self) -> &A {
        &self.session.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.session.api
    }

    pub fn now_ms(&self) -> f64 {
        self.session.now_ms
    }

    pub fn owner(&self) -> Option<&OwnerRef> {
        self.cursor.owner()
    }

    pub fn program_name(&self) -> &str {
        self.cursor.program_name()
    }

    /// Unknown labels are logged and leave the run on the following line.
    pub fn goto_label(&mut self, label: &str) -> bool {
        if self.cursor.goto_label(label) {
            return true;
        }
        warn!(
            "Label \"{}\" not found in \"{}\"; continuing with the next line.",
            label,
            self.cursor.program_name()
        );
        false
    }

    pub fn end_script(&mut self) {
        self.cursor.end_script();
    }

    /// Calls `path` as a sub-program; the current run resumes after this
    /// command once it ends. Parallel runs cannot call, so their request is
    /// queued for the foreground instead. Returns false if the program
    /// could not be loaded.
    pub fn run_script(&mut self, path: &str) -> bool {
        if !self.cursor.can_call() {
            debug!(
                "\"{}\" cannot call \"{}\" directly; queued for the foreground.",
                self.cursor.program_name(),
                path
            );
            self.enqueue(path);
            return true;
        }

        match self.session.loader.load(path) {
            Ok(program) => {
                self.cursor.call(program);
                true
            }
            Err(error) => {
                warn!("Failed to load \"{}\": {}", path, error);
                false
            }
        }
    }

    /// Queues `path` to run in the foreground once it is idle, owned by the
    /// current owner.
    pub fn enqueue(&mut self, path: &str) {
        let owner = self.cursor.owner().cloned();
        self.session
            .requests
            .push(ScriptRequest::Enqueue(QueuedScript {
                path: path.to_string(),
                owner,
            }));
    }

    pub fn run_parallel(&mut self, path: &str, delay_ms: f64) {
        self.session.requests.push(ScriptRequest::Parallel {
            path: path.to_string(),
            delay_ms,
        });
    }

    pub fn wait_until<F>(&mut self, predicate: F) -> Completion
    where
        F: FnMut(&A, f64) -> bool + 'static,
    {
        let session = &mut *self.session;
        session
            .resolver
            .wait_until(&session.api, session.now_ms, predicate)
    }

    /// Completion resolved by the host through `resolve_named`.
    pub fn wait_for_named(&mut self, name: &str) -> Completion {
        self.session.resolver.wait_for_named(name)
    }

    /// Resolves `$name` against [`ScriptHost::variable`]
    /// (missing variables read as null); anything else is a literal.
    pub fn resolve_value(&self, expr: &str) -> ScriptValue
    where
        A: ScriptHost,
    {
        let expr = expr.trim();
        if let Some(name) = expr.strip_prefix('$') {
            return self.session.api.variable(name).unwrap_or_else(|| {
                debug!("Variable \"{}\" is not set.", name);
                ScriptValue::Null
            });
        }

        match expr.parse::<f64>() {
            Ok(number) => ScriptValue::Number(number),
            Err(_) => ScriptValue::String(expr.to_string()),
        }
    }

    pub fn resolve_string(&self, expr: &str) -> String
    where
        A: ScriptHost,
    {
        if expr.trim_start().starts_with('$') {
            return self.resolve_value(expr).to_string();
        }
        expr.to_string()
    }

    pub fn resolve_number(&self, expr: &str) -> Option<f64>
    where
        A: ScriptHost,
    {
        self.resolve_value(expr).as_number()
    }
}
