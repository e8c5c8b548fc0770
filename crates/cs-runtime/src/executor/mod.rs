use std::collections::VecDeque;
use std::rc::Rc;

use cs_core::{OwnerRef, ParallelScriptSave, Program, ScriptError, ScriptValue};
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::context::{QueuedScript, ScriptRequest, Session};
use crate::hooks::DebugHooks;
use crate::loader::ProgramLoader;
use crate::parallel::ParallelScheduler;
use crate::registry::{CommandRegistry, ScriptHost};
use crate::resolver::BlockingResolver;

mod state;
mod step;

pub(crate) use state::{ExecutionState, ForegroundCursor};

pub struct ScriptExecutorOptions<A> {
    pub registry: CommandRegistry<A>,
    pub api: A,
    pub loader: Box<dyn ProgramLoader>,
    pub hooks: Option<Rc<dyn DebugHooks>>,
    pub config: ExecutorConfig,
}

/// Runs one foreground program at a time (with call/return between
/// programs), the queue of triggered programs and the parallel scripts.
///
/// The executor belongs to a game session: build one per new game and call
/// [`ScriptExecutor::stop_all`] before loading a save so that no suspended
/// handler resumes against reloaded state.
pub struct ScriptExecutor<A> {
    registry: CommandRegistry<A>,
    session: Session<A>,
    state: ExecutionState<A>,
    queue: VecDeque<QueuedScript>,
    parallel: ParallelScheduler<A>,
    hooks: Option<Rc<dyn DebugHooks>>,
    config: ExecutorConfig,
}

impl<A: ScriptHost> ScriptExecutor<A> {
    pub fn new(options: ScriptExecutorOptions<A>) -> Self {
        Self {
            registry: options.registry,
            session: Session::new(options.api, options.loader),
            state: ExecutionState::default(),
            queue: VecDeque::new(),
            parallel: ParallelScheduler::new(),
            hooks: options.hooks,
            config: options.config,
        }
    }

    /// Starts `program` in the foreground. If a program is already active it
    /// becomes the caller and resumes after `program` ends.
    pub fn run(&mut self, program: Rc<Program>, owner: Option<OwnerRef>) -> Result<(), ScriptError> {
        debug!("Running \"{}\" in the foreground.", program.name());
        self.state.begin(program, owner, self.hooks.as_deref());
        let result = self.step();
        self.flush_requests();
        result
    }

    /// Loads and runs `path`. A load failure is logged, leaves the current
    /// foreground untouched and returns `Ok(false)`.
    pub fn run_path(&mut self, path: &str, owner: Option<OwnerRef>) -> Result<bool, ScriptError> {
        let Some(program) = self.load_logged(path) else {
            return Ok(false);
        };
        self.run(program, owner)?;
        Ok(true)
    }

    /// Queues `path` to start once no foreground program is running.
    pub fn enqueue(&mut self, path: &str, owner: Option<OwnerRef>) {
        debug!("Queued \"{}\".", path);
        self.queue.push_back(QueuedScript {
            path: path.to_string(),
            owner,
        });
    }

    /// Continues a foreground program paused by a command.
    pub fn resume(&mut self) -> Result<(), ScriptError> {
        self.state.paused = false;
        let result = self.step();
        self.flush_requests();
        result
    }

    /// Once per host frame: resolve satisfied poll waits (continuing the
    /// foreground synchronously), step parallel scripts, then start the next
    /// queued program if the foreground is idle.
    pub fn update(&mut self, delta_ms: f64) -> Result<(), ScriptError> {
        let delta_ms = self.config.clamp_delta(delta_ms);
        self.session.now_ms += delta_ms;

        let session = &mut self.session;
        let resolved = session.resolver.tick(&session.api, session.now_ms);
        if resolved > 0 {
            debug!("Resolved {} poll wait(s).", resolved);
        }
        self.step()?;

        self.parallel.step(
            delta_ms,
            &self.registry,
            &mut self.session,
            self.hooks.as_deref(),
            self.config.max_ops_per_step,
        )?;
        self.flush_requests();

        if !self.state.running {
            if let Some(next) = self.queue.pop_front() {
                debug!("Starting queued \"{}\".", next.path);
                if let Some(program) = self.load_logged(&next.path) {
                    self.state.begin(program, next.owner, self.hooks.as_deref());
                    self.step()?;
                }
            }
        }

        self.flush_requests();
        Ok(())
    }

    /// Settles the oldest waiter for `name` and, when that lets the
    /// foreground continue, runs it right away.
    pub fn resolve_named(&mut self, name: &str, value: ScriptValue) -> Result<bool, ScriptError> {
        if !self.session.resolver.resolve_named(name, value) {
            return Ok(false);
        }
        let result = self.step();
        self.flush_requests();
        result.map(|_| true)
    }

    pub fn run_parallel(&mut self, path: &str, delay_ms: f64) {
        self.parallel.add(path, delay_ms);
    }

    /// Parallel scripts as save data, including ones requested by commands
    /// that have not joined the scheduler yet.
    pub fn parallel_snapshot(&self) -> Vec<ParallelScriptSave> {
        let mut saves = self.parallel.snapshot();
        saves.extend(self.session.requests.iter().filter_map(|request| match request {
            ScriptRequest::Parallel { path, delay_ms } => Some(ParallelScriptSave {
                program_path: path.clone(),
                remaining_delay_ms: delay_ms.max(0.0),
            }),
            ScriptRequest::Enqueue(_) => None,
        }));
        saves
    }

    /// Replaces every parallel script with not-yet-started ones; restored
    /// programs start again from their first line.
    pub fn restore_parallel(&mut self, saves: Vec<ParallelScriptSave>) {
        self.session
            .requests
            .retain(|request| !matches!(request, ScriptRequest::Parallel { .. }));
        self.parallel.restore(saves);
    }

    /// Hard reset. Suspended handlers are dropped without ever resuming.
    pub fn stop_all(&mut self) {
        self.state.clear();
        self.session.resolver.clear();
        self.session.requests.clear();
        self.queue.clear();
        self.parallel.clear();
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// True while the foreground waits for a suspension to settle.
    pub fn is_suspended(&self) -> bool {
        self.state.pending.is_some()
    }

    pub fn current_program_name(&self) -> Option<&str> {
        self.state.program.as_deref().map(Program::name)
    }

    pub fn current_line(&self) -> usize {
        self.state.line
    }

    pub fn call_depth(&self) -> usize {
        self.state.call_stack.len()
    }

    pub fn owner(&self) -> Option<&OwnerRef> {
        self.state.owner.as_ref()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn has_pending_waits(&self) -> bool {
        self.session.resolver.has_pending()
    }

    pub fn resolver(&self) -> &BlockingResolver<A> {
        &self.session.resolver
    }

    pub fn parallel(&self) -> &ParallelScheduler<A> {
        &self.parallel
    }

    pub fn registry(&self) -> &CommandRegistry<A> {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn now_ms(&self) -> f64 {
        self.session.now_ms
    }

    pub fn api(&self) -> &A {
        &self.session.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.session.api
    }

    fn load_logged(&mut self, path: &str) -> Option<Rc<Program>> {
        match self.session.loader.load(path) {
            Ok(program) => Some(program),
            Err(error) => {
                warn!("Failed to load \"{}\": {}", path, error);
                None
            }
        }
    }

    fn flush_requests(&mut self) {
        for request in self.session.requests.drain(..) {
            match request {
                ScriptRequest::Enqueue(queued) => {
                    debug!("Queued \"{}\".", queued.path);
                    self.queue.push_back(queued);
                }
                ScriptRequest::Parallel { path, delay_ms } => self.parallel.add(&path, delay_ms),
            }
        }
    }
}
