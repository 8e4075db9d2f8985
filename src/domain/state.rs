// ============================================================
// Layer 3 — Training State
// ============================================================
// Only the global step survives a restart. The epoch index is a
// plain loop counter owned by the trainer.
//
// Phase transitions driven by ml::trainer:
//
//   Init → RestoreOrInit → EpochRunning ⇄ EpochDone → Finished
//                               │
//                               └──(interrupt)──→ Interrupted

use serde::{Deserialize, Serialize};

/// Persisted part of a training run (model parameters live in the model).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Number of optimizer updates applied so far
    pub global_step: u64,
}

impl TrainingState {
    pub fn at_step(global_step: u64) -> Self {
        Self { global_step }
    }

    /// Advance by one optimizer update and return the new step
    pub fn advance(&mut self) -> u64 {
        self.global_step += 1;
        self.global_step
    }
}

/// Phases of the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    Init,
    RestoreOrInit,
    EpochRunning { epoch: usize },
    EpochDone { epoch: usize },
    Interrupted { epoch: usize },
    Finished,
}

impl TrainingPhase {
    /// True once the loop will not run another step
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Interrupted { .. } | Self::Finished)
    }
}
