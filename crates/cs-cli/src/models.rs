use std::collections::BTreeMap;

use cs_core::ScriptValue;

pub(crate) const SCRIPT_EXTENSION: &str = ".script";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScenario {
    pub(crate) id: String,
    pub(crate) sources: BTreeMap<String, String>,
    pub(crate) entry_program: String,
}

#[derive(Debug, Clone)]
pub(crate) struct PlayOptions {
    pub(crate) frames: usize,
    pub(crate) frame_ms: f64,
    pub(crate) events: Vec<(String, ScriptValue)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayState {
    Finished,
    Running,
}

#[derive(Debug, Clone)]
pub(crate) struct PlayReport {
    pub(crate) state: PlayState,
    pub(crate) frames_run: usize,
    pub(crate) texts: Vec<String>,
    pub(crate) parallel_left: usize,
    pub(crate) undelivered_events: Vec<String>,
}
