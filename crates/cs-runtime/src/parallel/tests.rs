use std::rc::Rc;

use cs_core::{ParallelScriptSave, ScriptValue};

use crate::test_support::*;
use crate::{DebugHooks, ExecutorConfig};

#[test]
fn delayed_script_starts_once_its_delay_has_elapsed() {
    let mut executor = executor_from(&[("bg", "Say(bg)")]);
    executor.run_parallel("bg", 100.0);
    assert_eq!(executor.parallel().delayed_len(), 1);

    executor.update(40.0).expect("update should pass");
    executor.update(40.0).expect("update should pass");
    assert!(log_of(&executor).is_empty());
    assert_eq!(executor.parallel_snapshot()[0].remaining_delay_ms, 20.0);

    executor.update(20.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["bg"]);
    assert!(executor.parallel().is_empty());
}

#[test]
fn parallel_script_keeps_running_while_foreground_is_paused() {
    let mut executor = executor_from(&[
        ("fg", "Pause"),
        ("bg", "@loop:\nSay(tick)\nWait(10)\nGoto(loop)"),
    ]);
    executor.run_path("fg", None).expect("run should pass");
    executor.run_parallel("bg", 0.0);

    executor.update(10.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["tick"]);

    executor.update(10.0).expect("update should pass");
    executor.update(10.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["tick", "tick", "tick"]);
    assert!(executor.is_paused());
    assert_eq!(executor.parallel().active_len(), 1);
}

#[test]
fn script_scheduled_by_a_command_waits_for_the_next_frame() {
    let mut executor = executor_from(&[
        ("fg", "Parallel(bg1)\nSay(fg)"),
        ("bg1", "Parallel(bg2)\nSay(one)"),
        ("bg2", "Say(two)"),
    ]);
    executor.run_path("fg", None).expect("run should pass");
    assert_eq!(log_of(&executor), vec!["fg"]);
    assert_eq!(executor.parallel().immediate_len(), 1);

    executor.update(16.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["fg", "one"]);

    executor.update(16.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["fg", "one", "two"]);
}

#[test]
fn snapshot_reports_countdowns_and_restore_restarts_programs() {
    let sources = [("a", "Say(a)"), ("b", "Say(b)\nWaitFlag(never)")];
    let mut executor = executor_from(&sources);
    executor.run_parallel("a", 300.0);
    executor.run_parallel("b", 0.0);

    executor.update(100.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["b"]);
    let saves = executor.parallel_snapshot();
    assert_eq!(
        saves,
        vec![
            ParallelScriptSave {
                program_path: "a".to_string(),
                remaining_delay_ms: 200.0,
            },
            ParallelScriptSave {
                program_path: "b".to_string(),
                remaining_delay_ms: 0.0,
            },
        ]
    );

    let mut restored = executor_from(&sources);
    restored.restore_parallel(saves);
    assert_eq!(restored.parallel().delayed_len(), 1);
    assert_eq!(restored.parallel().immediate_len(), 1);
    assert_eq!(restored.parallel().active_len(), 0);

    restored.update(16.0).expect("update should pass");
    assert_eq!(log_of(&restored), vec!["b"]);
    restored.update(300.0).expect("update should pass");
    assert_eq!(log_of(&restored), vec!["b", "a"]);
}

#[test]
fn missing_program_is_dropped() {
    let mut executor = executor_from(&[]);
    executor.run_parallel("ghost", 0.0);
    executor.update(16.0).expect("update should not fail");
    assert!(executor.parallel().is_empty());
}

#[test]
fn pause_yields_until_the_next_frame() {
    let mut executor = executor_from(&[("bg", "Say(one)\nPause\nSay(two)")]);
    executor.run_parallel("bg", 0.0);

    executor.update(16.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["one"]);
    assert_eq!(executor.parallel().len(), 1);

    executor.update(16.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["one", "two"]);
    assert!(executor.parallel().is_empty());
}

#[test]
fn call_from_a_parallel_script_goes_to_the_foreground_queue() {
    let mut executor = executor_from(&[("bg", "Call(sub)\nSay(bg)"), ("sub", "Owner")]);
    executor.run_parallel("bg", 0.0);

    executor.update(16.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["bg", "none"]);
    assert_eq!(executor.queued_len(), 0);
    assert!(!executor.is_running());
}

#[test]
fn end_finishes_a_parallel_script() {
    let mut executor = executor_from(&[("bg", "End\nSay(never)")]);
    executor.run_parallel("bg", 0.0);
    executor.update(16.0).expect("update should pass");
    assert!(log_of(&executor).is_empty());
    assert!(executor.parallel().is_empty());
}

#[test]
fn unknown_label_in_parallel_continues() {
    let mut executor = executor_from(&[("bg", "Goto(nowhere)\nSay(after)")]);
    executor.run_parallel("bg", 0.0);
    executor.update(16.0).expect("update should pass");
    assert_eq!(log_of(&executor), vec!["after"]);
}

#[test]
fn runaway_parallel_loop_hits_the_step_guard() {
    let config = ExecutorConfig {
        max_ops_per_step: 20,
        ..ExecutorConfig::default()
    };
    let mut executor = executor_with(
        &[("bg", "@top:\nGoto(top)")],
        test_registry(),
        None,
        config,
    );
    executor.run_parallel("bg", 0.0);
    let error = executor.update(16.0).expect_err("guard should trip");
    assert_eq!(error.code, "EXECUTOR_STEP_GUARD");
}

#[test]
fn start_hook_fires_when_the_runner_starts() {
    let hooks = Rc::new(RecordingHooks::default());
    let shared: Rc<dyn DebugHooks> = hooks.clone();
    let mut executor = executor_with(
        &[("bg", "Say(x)")],
        test_registry(),
        Some(shared),
        ExecutorConfig::default(),
    );
    executor.run_parallel("bg", 50.0);
    executor.update(16.0).expect("update should pass");
    assert!(hooks.starts.borrow().is_empty());

    executor.update(34.0).expect("update should pass");
    assert_eq!(*hooks.starts.borrow(), vec![("bg".to_string(), 1)]);
    assert_eq!(*hooks.lines.borrow(), vec!["bg:0"]);
}

#[test]
fn restore_releases_event_waits_of_dropped_runners() {
    let mut executor = executor_from(&[
        ("bg", "Ask(choice)"),
        ("fg", "Ask(choice)\nSay(fg-after)"),
    ]);
    executor.run_parallel("bg", 0.0);
    executor.update(16.0).expect("update should pass");
    assert!(executor.has_pending_waits());

    executor.restore_parallel(vec![]);
    assert!(!executor.has_pending_waits());

    executor.run_path("fg", None).expect("run should pass");
    assert_eq!(executor.resolver().pending_events("choice"), 1);
    assert!(executor
        .resolve_named("choice", ScriptValue::from(1))
        .expect("resolve should pass"));
    assert_eq!(log_of(&executor), vec!["answer:1", "fg-after"]);
    assert!(!executor.is_running());
}
