// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Drives one training run through its phases:
//
//   Init → RestoreOrInit → EpochRunning ⇄ EpochDone → Finished
//                               │
//                               └──(interrupt)──→ Interrupted
//
// Every step: forward → MSE loss → backward → RMSProp update,
// then global_step += 1. The step counter, not the epoch, decides
// when to log a summary and when to write a checkpoint.
//
// Key Burn 0.20 insight:
//   - Training needs an AutodiffBackend for loss.backward()
//   - Dropout is only active on the autodiff backend
//   - optim.to_record() is saved next to the weights so RMSProp's
//     moving averages survive a restart
//
// Reference: Burn Book §5, Hinton (2012) RMSProp lecture notes

use anyhow::{Context, Result};
use burn::{
    optim::{GradientsParams, Optimizer, RmsPropConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::io::Write;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SteeringBatch, SteeringBatcher},
    dataset::Dataset,
};
use crate::domain::{
    state::{TrainingPhase, TrainingState},
    traits::MetricsSink,
};
use crate::infra::{checkpoint::CheckpointManager, interrupt::CancellationToken};
use crate::ml::model::{SteeringModel, SteeringModelConfig};

/// Tag under which the batch loss is sent to the metrics sink
pub const LOSS_TAG: &str = "loss";

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub final_phase: TrainingPhase,
    pub global_step: u64,
    pub epochs_completed: usize,
    pub last_loss: Option<f64>,
    /// Steps checkpointed during this run, in order
    pub checkpoints: Vec<u64>,
    /// Step of the checkpoint the run resumed from, if any
    pub restored_from: Option<u64>,
}

impl TrainingReport {
    pub fn was_interrupted(&self) -> bool {
        matches!(self.final_phase, TrainingPhase::Interrupted { .. })
    }
}

pub struct Trainer<'a, B: AutodiffBackend, S: MetricsSink> {
    cfg: &'a TrainConfig,
    model_cfg: SteeringModelConfig,
    checkpoints: CheckpointManager,
    metrics: S,
    cancel: CancellationToken,
    device: B::Device,
    phase: TrainingPhase,
}

impl<'a, B: AutodiffBackend, S: MetricsSink> Trainer<'a, B, S> {
    pub fn new(cfg: &'a TrainConfig, metrics: S, cancel: CancellationToken, device: B::Device) -> Self {
        Self {
            cfg,
            model_cfg: cfg.model_config(),
            checkpoints: cfg.checkpoint_manager(),
            metrics,
            cancel,
            device,
            phase: TrainingPhase::Init,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn into_metrics(self) -> S {
        self.metrics
    }

    // ── RMSProp optimiser ─────────────────────────────────────────────────────
    // v = α*v + (1-α)*g²
    // θ = θ - lr * g / (√v + ε)
    fn optimizer(&self) -> impl Optimizer<SteeringModel<B>, B> {
        RmsPropConfig::new()
            .with_alpha(0.9)
            .with_epsilon(1e-10)
            .init()
    }

    /// Run every epoch, or stop early when the cancellation token fires.
    pub fn run(&mut self, dataset: &mut Dataset) -> Result<TrainingReport> {
        anyhow::ensure!(dataset.is_labeled(), "Training needs a labeled dataset");

        // ── Restore or init ───────────────────────────────────────────────────
        self.phase = TrainingPhase::RestoreOrInit;
        let fresh_model = self.model_cfg.init::<B>(&self.device);
        let fresh_optim = self.optimizer();

        let (mut model, mut optim, mut state, restored_from) = if self.checkpoints.exists() {
            match self.checkpoints.restore(fresh_model, fresh_optim, &self.model_cfg, &self.device) {
                Ok(restored) => {
                    tracing::info!("Model restored from step {}", restored.state.global_step);
                    let step = restored.state.global_step;
                    (restored.model, restored.optim, restored.state, Some(step))
                }
                Err(e) => {
                    tracing::warn!("Could not restore checkpoint, starting fresh: {}", e);
                    (
                        self.model_cfg.init::<B>(&self.device),
                        self.optimizer(),
                        TrainingState::default(),
                        None,
                    )
                }
            }
        } else {
            self.checkpoints.ensure_dir()?;
            tracing::info!(
                "Created checkpoint directory '{}', initialising a new model",
                self.checkpoints.dir().display()
            );
            (fresh_model, fresh_optim, TrainingState::default(), None)
        };

        let batcher = SteeringBatcher::<B>::new(self.device.clone());
        let mut report = TrainingReport {
            final_phase: self.phase,
            global_step: state.global_step,
            epochs_completed: 0,
            last_loss: None,
            checkpoints: Vec::new(),
            restored_from,
        };

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 0..self.cfg.epochs {
            if self.cancel.is_cancelled() {
                self.phase = TrainingPhase::Interrupted { epoch };
                break;
            }
            self.phase = TrainingPhase::EpochRunning { epoch };

            let mut batches = dataset.iter();
            loop {
                if self.cancel.is_cancelled() {
                    self.phase = TrainingPhase::Interrupted { epoch };
                    break;
                }
                let Some(batch) = batches.next() else {
                    break;
                };
                let batch = batch.with_context(|| format!("Failed to load a batch in epoch {epoch}"))?;
                let SteeringBatch { images, targets } = batcher.batch(&batch)?;

                // Forward + loss
                let (loss, _) = model.forward_loss(images, targets);
                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

                // Backward pass + RMSProp update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(self.cfg.learning_rate, model, grads);

                let step = state.advance();
                report.last_loss = Some(loss_val);

                print!("\rEpoch: {} Step: {} Loss: {:.2}", epoch, step, loss_val);
                std::io::stdout().flush().ok();

                if self.cfg.log_every > 0 && step % self.cfg.log_every == 0 {
                    self.metrics.scalar(LOSS_TAG, loss_val, step)?;
                }

                if self.cfg.save_every > 0 && step % self.cfg.save_every == 0 {
                    self.checkpoints.save(state, &model, &optim, &self.model_cfg)?;
                    report.checkpoints.push(step);
                }
            }

            if self.phase.is_terminal() {
                break;
            }
            self.phase = TrainingPhase::EpochDone { epoch };
            report.epochs_completed += 1;
            tracing::debug!("Epoch {} done at step {}", epoch, state.global_step);
        }
        println!();

        // ── Interrupt save ────────────────────────────────────────────────────
        if let TrainingPhase::Interrupted { epoch } = self.phase {
            let path = self
                .checkpoints
                .save(state, &model, &optim, &self.model_cfg)
                .context("Failed to save the interrupt checkpoint")?;
            if report.checkpoints.last() != Some(&state.global_step) {
                report.checkpoints.push(state.global_step);
            }
            println!(
                "Interrupted during epoch {}. Model saved at step {} in '{}'",
                epoch,
                state.global_step,
                path.display()
            );
        } else {
            self.phase = TrainingPhase::Finished;
            tracing::info!("Training complete at step {}", state.global_step);
        }

        report.final_phase = self.phase;
        report.global_step = state.global_step;
        Ok(report)
    }
}
