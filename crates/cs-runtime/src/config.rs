use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_OPS_PER_STEP: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    /// Opcodes one step may run without yielding before it reports
    /// `EXECUTOR_STEP_GUARD`.
    pub max_ops_per_step: usize,
    /// Upper bound applied to the delta passed to `update`.
    pub max_frame_delta_ms: Option<f64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_ops_per_step: DEFAULT_MAX_OPS_PER_STEP,
            max_frame_delta_ms: None,
        }
    }
}

impl ExecutorConfig {
    pub fn clamp_delta(&self, delta_ms: f64) -> f64 {
        let delta_ms = delta_ms.max(0.0);
        match self.max_frame_delta_ms {
            Some(limit) => delta_ms.min(limit),
            None => delta_ms,
        }
    }
}
