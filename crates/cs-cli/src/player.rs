use cs_core::{ScriptError, ScriptValue};
use cs_runtime::ScriptExecutor;
use tracing::{debug, info};

use crate::{json_string, DemoHost, PlayOptions, PlayReport, PlayState};

/// Event arguments accept JSON scalars (`true`, `3`, `"x"`); anything else
/// is taken as a plain string.
pub(crate) fn parse_event_value(raw: &str) -> ScriptValue {
    serde_json::from_str::<ScriptValue>(raw).unwrap_or_else(|_| ScriptValue::from(raw))
}

fn is_idle(executor: &ScriptExecutor<DemoHost>) -> bool {
    !executor.is_running()
        && executor.queued_len() == 0
        && executor.parallel().is_empty()
        && !executor.has_pending_waits()
}

/// Resolves scripted events whose name has a waiter, oldest argument first,
/// until none of the remaining ones match.
fn deliver_events(
    executor: &mut ScriptExecutor<DemoHost>,
    events: &mut Vec<(String, ScriptValue)>,
) -> Result<(), ScriptError> {
    while let Some(index) = events
        .iter()
        .position(|(name, _)| executor.resolver().pending_events(name) > 0)
    {
        let (name, value) = events.remove(index);
        info!("Delivering event \"{}\" = {}", name, value);
        executor.resolve_named(&name, value)?;
    }
    Ok(())
}

/// Headless frame loop: a paused foreground is resumed at the start of the
/// next frame, events are delivered as soon as something waits on them and
/// the loop stops early once nothing is left to run.
pub(crate) fn play(
    executor: &mut ScriptExecutor<DemoHost>,
    options: PlayOptions,
) -> Result<PlayReport, ScriptError> {
    let mut events = options.events;
    deliver_events(executor, &mut events)?;
    let mut texts = executor.api_mut().drain_transcript();

    let mut frames_run = 0usize;
    while frames_run < options.frames && !is_idle(executor) {
        if executor.is_paused() {
            debug!("Resuming paused foreground.");
            executor.resume()?;
        }
        executor.update(options.frame_ms)?;
        frames_run += 1;
        deliver_events(executor, &mut events)?;
        texts.extend(executor.api_mut().drain_transcript());
    }

    Ok(PlayReport {
        state: if is_idle(executor) {
            PlayState::Finished
        } else {
            PlayState::Running
        },
        frames_run,
        texts,
        parallel_left: executor.parallel().len(),
        undelivered_events: events.into_iter().map(|(name, _)| name).collect(),
    })
}

pub(crate) fn emit_report(report: &PlayReport) {
    println!("RESULT:OK");
    match report.state {
        PlayState::Finished => println!("STATE:FINISHED"),
        PlayState::Running => println!("STATE:RUNNING"),
    }
    println!("FRAMES:{}", report.frames_run);
    for text in &report.texts {
        println!("TEXT_JSON:{}", json_string(text));
    }
    println!("PARALLEL:{}", report.parallel_left);
    for name in &report.undelivered_events {
        println!("UNDELIVERED_EVENT:{}", name);
    }
}
