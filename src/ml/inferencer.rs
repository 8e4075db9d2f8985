// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads the latest checkpoint and predicts a steering angle for
// one camera frame. Unlike training, a missing or unreadable
// checkpoint is an error here.
//
// Runs on a plain (non-autodiff) backend, so dropout is inactive.
use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::Path;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::SteeringBatcher,
    decode::{FastPathDecoder, ImageDecoder},
};
use crate::domain::example::{Batch, Example};
use crate::ml::model::SteeringModel;

pub struct Inferencer<B: Backend> {
    model:   SteeringModel<B>,
    decoder: FastPathDecoder,
    batcher: SteeringBatcher<B>,
    step:    u64,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(cfg: &TrainConfig, device: B::Device) -> Result<Self> {
        let model_cfg = cfg.model_config();
        let ckpt      = cfg.checkpoint_manager();

        let model: SteeringModel<B> = model_cfg.init(&device);
        let (model, step) = ckpt
            .load_model(model, &model_cfg, &device)
            .with_context(|| format!("No usable checkpoint under '{}'", ckpt.dir().display()))?;

        let decoder = FastPathDecoder::new(cfg.img_size, cfg.img_depth)?;
        tracing::info!("Model loaded from checkpoint at step {}", step);

        Ok(Self { model, decoder, batcher: SteeringBatcher::new(device), step })
    }

    /// Global step of the loaded checkpoint
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Predicted steering angle for the frame at `image_path`.
    pub fn predict(&self, image_path: &Path) -> Result<f32> {
        let image = self.decoder.decode(image_path)?;
        let batch = Batch::new(vec![Example::new(image, self.decoder.output_shape(), None)]);

        let images     = self.batcher.images(&batch)?;
        let prediction = self.model.forward(images);

        let angle = prediction.into_scalar().elem::<f32>();
        tracing::debug!("'{}' → {:.4}", image_path.display(), angle);
        Ok(angle)
    }
}
