use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use cs_core::{ScriptError, ScriptValue};

use crate::{
    CommandOutcome, CommandRegistry, DebugHooks, ExecutorConfig, ProgramCache, ScriptExecutor,
    ScriptExecutorOptions, ScriptHost, Suspension,
};

#[derive(Debug, Default)]
pub(crate) struct TestHost {
    pub(crate) log: Vec<String>,
    pub(crate) variables: HashMap<String, ScriptValue>,
    pub(crate) flags: HashSet<String>,
}

impl ScriptHost for TestHost {
    fn variable(&self, name: &str) -> Option<ScriptValue> {
        self.variables.get(name).cloned()
    }
}

#[derive(Default)]
pub(crate) struct RecordingHooks {
    pub(crate) starts: RefCell<Vec<(String, usize)>>,
    pub(crate) lines: RefCell<Vec<String>>,
}

impl DebugHooks for RecordingHooks {
    fn on_script_start(&self, name: &str, total_lines: usize, lines: &[String]) {
        assert_eq!(total_lines, lines.len());
        self.starts.borrow_mut().push((name.to_string(), total_lines));
    }

    fn on_line_executed(&self, name: &str, line: usize) {
        self.lines.borrow_mut().push(format!("{}:{}", name, line));
    }
}

pub(crate) fn test_registry() -> CommandRegistry<TestHost> {
    let mut registry = CommandRegistry::<TestHost>::new();
    registry
        .register("say", |call, ctx| {
            let text = ctx.resolve_string(call.param(0).unwrap_or_default());
            ctx.api_mut().log.push(text);
            Ok(CommandOutcome::Continue)
        })
        .register("wait", |call, ctx| {
            let delay = ctx.resolve_number(call.param(0).unwrap_or("0")).unwrap_or(0.0);
            let until = ctx.now_ms() + delay;
            Ok(ctx.wait_until(move |_, now| now >= until).into())
        })
        .register("waitflag", |call, ctx| {
            let flag = call.param(0).unwrap_or_default().to_string();
            Ok(ctx
                .wait_until(move |host: &TestHost, _| host.flags.contains(&flag))
                .into())
        })
        .register("ask", |call, ctx| {
            let target = call.result_token.to_string();
            let completion = ctx.wait_for_named(call.param(0).unwrap_or_default());
            Ok(Suspension::<TestHost>::new(completion)
                .then(move |value, ctx| {
                    ctx.api_mut().log.push(format!("answer:{}", value));
                    if value.is_truthy() && !target.is_empty() {
                        ctx.goto_label(&target);
                    }
                    Ok(CommandOutcome::Continue)
                })
                .into())
        })
        .register("goto", |call, ctx| {
            ctx.goto_label(call.param(0).unwrap_or_default());
            Ok(CommandOutcome::Continue)
        })
        .register("ifvar", |call, ctx| {
            let actual = ctx.resolve_value(call.param(0).unwrap_or_default());
            let expected = ctx.resolve_value(call.param(1).unwrap_or_default());
            if actual == expected && call.has_result_token() {
                ctx.goto_label(call.result_token);
            }
            Ok(CommandOutcome::Continue)
        })
        .register("call", |call, ctx| {
            ctx.run_script(call.param(0).unwrap_or_default());
            Ok(CommandOutcome::Continue)
        })
        .register("end", |_, ctx| {
            ctx.end_script();
            Ok(CommandOutcome::Continue)
        })
        .register("pause", |_, _| Ok(CommandOutcome::Pause))
        .register("parallel", |call, ctx| {
            let delay = ctx.resolve_number(call.param(1).unwrap_or("0")).unwrap_or(0.0);
            ctx.run_parallel(call.param(0).unwrap_or_default(), delay);
            Ok(CommandOutcome::Continue)
        })
        .register("enqueue", |call, ctx| {
            ctx.enqueue(call.param(0).unwrap_or_default());
            Ok(CommandOutcome::Continue)
        })
        .register("owner", |_, ctx| {
            let owner = ctx
                .owner()
                .map(|owner| format!("{}:{}", owner.kind, owner.id))
                .unwrap_or_else(|| "none".to_string());
            ctx.api_mut().log.push(owner);
            Ok(CommandOutcome::Continue)
        })
        .register("fail", |call, _| {
            Err(ScriptError::at_line(
                "TEST_FAIL",
                "fail command executed",
                call.source_line,
            ))
        });
    registry
}

pub(crate) fn cache_from(sources: &[(&str, &str)]) -> ProgramCache {
    let mut cache = ProgramCache::new();
    for (path, source) in sources {
        let program = cs_parser::parse_program(path, source).expect("parse should pass");
        cache.insert(*path, program);
    }
    cache
}

pub(crate) fn executor_with(
    sources: &[(&str, &str)],
    registry: CommandRegistry<TestHost>,
    hooks: Option<Rc<dyn DebugHooks>>,
    config: ExecutorConfig,
) -> ScriptExecutor<TestHost> {
    ScriptExecutor::new(ScriptExecutorOptions {
        registry,
        api: TestHost::default(),
        loader: Box::new(cache_from(sources)),
        hooks,
        config,
    })
}

pub(crate) fn executor_from(sources: &[(&str, &str)]) -> ScriptExecutor<TestHost> {
    executor_with(sources, test_registry(), None, ExecutorConfig::default())
}

pub(crate) fn log_of(executor: &ScriptExecutor<TestHost>) -> Vec<String> {
    executor.api().log.clone()
}
