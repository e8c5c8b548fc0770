use std::collections::{HashMap, HashSet};

use cs_core::{ScriptError, ScriptValue};
use cs_runtime::{CommandOutcome, CommandRegistry, ScriptHost, Suspension};
use tracing::info;

/// Side-effect API the player hands to its commands: a transcript instead of
/// a dialogue box, plus variables and flags for branching.
#[derive(Debug, Default)]
pub(crate) struct DemoHost {
    pub(crate) transcript: Vec<String>,
    pub(crate) variables: HashMap<String, ScriptValue>,
    pub(crate) flags: HashSet<String>,
}

impl DemoHost {
    pub(crate) fn drain_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }
}

impl ScriptHost for DemoHost {
    fn variable(&self, name: &str) -> Option<ScriptValue> {
        self.variables.get(name).cloned()
    }
}

fn values_match(left: &ScriptValue, right: &ScriptValue) -> bool {
    match (left.as_number(), right.as_number()) {
        (Some(left), Some(right)) => left == right,
        _ => left.to_string() == right.to_string(),
    }
}

fn required<'a>(params: &'a [String], index: usize, command: &str) -> Result<&'a str, ScriptError> {
    params.get(index).map(String::as_str).ok_or_else(|| {
        ScriptError::new(
            "CLI_COMMAND_ARGS",
            format!("{} expects at least {} parameter(s).", command, index + 1),
        )
    })
}

pub(crate) fn demo_registry() -> CommandRegistry<DemoHost> {
    let mut registry = CommandRegistry::<DemoHost>::new();
    registry
        .register("say", |call, ctx| {
            let text = call
                .parameters
                .iter()
                .map(|param| ctx.resolve_string(param))
                .collect::<Vec<_>>()
                .join(" ");
            ctx.api_mut().transcript.push(text);
            Ok(CommandOutcome::Continue)
        })
        .register("log", |call, ctx| {
            let text = ctx.resolve_string(call.param(0).unwrap_or_default());
            info!("[{}] {}", ctx.program_name(), text);
            Ok(CommandOutcome::Continue)
        })
        .register("set", |call, ctx| {
            let name = required(call.parameters, 0, "Set")?.to_string();
            let value = ctx.resolve_value(call.param(1).unwrap_or_default());
            ctx.api_mut().variables.insert(name, value);
            Ok(CommandOutcome::Continue)
        })
        .register("add", |call, ctx| {
            let name = required(call.parameters, 0, "Add")?.to_string();
            let amount = ctx.resolve_number(call.param(1).unwrap_or("1")).unwrap_or(0.0);
            let current = ctx
                .api()
                .variables
                .get(&name)
                .and_then(ScriptValue::as_number)
                .unwrap_or(0.0);
            ctx.api_mut()
                .variables
                .insert(name, ScriptValue::Number(current + amount));
            Ok(CommandOutcome::Continue)
        })
        .register("if", |call, ctx| {
            let left = ctx.resolve_value(required(call.parameters, 0, "If")?);
            let right = ctx.resolve_value(call.param(1).unwrap_or("true"));
            if call.has_result_token() && values_match(&left, &right) {
                ctx.goto_label(call.result_token);
            }
            Ok(CommandOutcome::Continue)
        })
        .register("goto", |call, ctx| {
            ctx.goto_label(required(call.parameters, 0, "Goto")?);
            Ok(CommandOutcome::Continue)
        })
        .register("wait", |call, ctx| {
            let delay = ctx.resolve_number(call.param(0).unwrap_or("0")).unwrap_or(0.0);
            let until = ctx.now_ms() + delay;
            Ok(ctx.wait_until(move |_, now| now >= until).into())
        })
        .register("flag", |call, ctx| {
            let flag = required(call.parameters, 0, "Flag")?.to_string();
            ctx.api_mut().flags.insert(flag);
            Ok(CommandOutcome::Continue)
        })
        .register("waitflag", |call, ctx| {
            let flag = required(call.parameters, 0, "WaitFlag")?.to_string();
            Ok(ctx
                .wait_until(move |host: &DemoHost, _| host.flags.contains(&flag))
                .into())
        })
        .register("choice", |call, ctx| {
            let event = required(call.parameters, 0, "Choice")?;
            let variable = call.param(1).map(str::to_string);
            let target = call.result_token.to_string();
            let completion = ctx.wait_for_named(event);
            Ok(Suspension::<DemoHost>::new(completion)
                .then(move |value, ctx| {
                    let branch = value.is_truthy();
                    if let Some(variable) = variable {
                        ctx.api_mut().variables.insert(variable, value);
                    }
                    if branch && !target.is_empty() {
                        ctx.goto_label(&target);
                    }
                    Ok(CommandOutcome::Continue)
                })
                .into())
        })
        .register("call", |call, ctx| {
            ctx.run_script(required(call.parameters, 0, "Call")?);
            Ok(CommandOutcome::Continue)
        })
        .register("queue", |call, ctx| {
            ctx.enqueue(required(call.parameters, 0, "Queue")?);
            Ok(CommandOutcome::Continue)
        })
        .register("parallel", |call, ctx| {
            let path = required(call.parameters, 0, "Parallel")?;
            let delay = ctx.resolve_number(call.param(1).unwrap_or("0")).unwrap_or(0.0);
            ctx.run_parallel(path, delay);
            Ok(CommandOutcome::Continue)
        })
        .register("pause", |_, _| Ok(CommandOutcome::Pause))
        .register("end", |_, ctx| {
            ctx.end_script();
            Ok(CommandOutcome::Continue)
        });
    registry
}
