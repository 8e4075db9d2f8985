// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Loads the latest checkpoint once and predicts the steering
// angle for camera frames.
//
// Inference runs on plain Wgpu: no autodiff, dropout inactive.

use anyhow::Result;
use std::path::Path;

use crate::application::train_use_case::TrainConfig;
use crate::ml::inferencer::Inferencer;

type InferBackend = burn::backend::Wgpu;

pub struct PredictUseCase {
    inferencer: Inferencer<InferBackend>,
}

impl PredictUseCase {
    /// Only the model shape and save_path of `config` matter here.
    pub fn new(config: &TrainConfig) -> Result<Self> {
        let device     = burn::backend::wgpu::WgpuDevice::default();
        let inferencer = Inferencer::from_checkpoint(config, device)?;
        Ok(Self { inferencer })
    }

    pub fn checkpoint_step(&self) -> u64 {
        self.inferencer.step()
    }

    pub fn predict(&self, image: &Path) -> Result<f32> {
        self.inferencer.predict(image)
    }
}
