// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Build the dataset from driving_log.csv   (Layer 4 - data)
//   Step 2: Open the metrics sink                    (Layer 6 - infra)
//   Step 3: Run the training state machine           (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::DatasetOptions,
    decode::DecodeStrategy,
    loader::{load_data, IMAGE_SUBDIR, MANIFEST_FILENAME},
};
use crate::infra::{
    checkpoint::CheckpointManager, interrupt::CancellationToken, metrics::CsvMetricsSink,
};
use crate::ml::{
    model::SteeringModelConfig,
    trainer::{Trainer, TrainingReport},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters and paths for a training run, fixed at start-up
// and passed by reference to the loader and the trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub img_depth:     usize,
    pub img_size:      usize,
    pub batch_size:    usize,
    pub dropout:       f64,
    pub learning_rate: f64,
    pub log_every:     u64,
    pub save_every:    u64,
    pub epochs:        usize,
    pub log_dir:       String,
    pub data_dir:      String,
    pub save_path:     String,
    pub shuffle:       bool,
    pub buffer_size:   usize,
    pub seed:          Option<u64>,
    pub max_to_keep:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            img_depth:     3,
            img_size:      32,
            batch_size:    64,
            dropout:       0.5,
            learning_rate: 1e-2,
            log_every:     20,
            save_every:    10,
            epochs:        1000,
            log_dir:       "./saved/logs/".to_string(),
            data_dir:      "./simulated_data/".to_string(),
            save_path:     "./saved/models/nvidia.ckpt".to_string(),
            shuffle:       true,
            buffer_size:   1000,
            seed:          None,
            max_to_keep:   5,
        }
    }
}

impl TrainConfig {
    /// <data_dir>/driving_log.csv
    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(MANIFEST_FILENAME)
    }

    /// <data_dir>/IMG
    pub fn image_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(IMAGE_SUBDIR)
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            shuffle:     self.shuffle,
            buffer_size: self.buffer_size,
            batch_size:  self.batch_size,
            decode:      DecodeStrategy::FastPath,
            img_size:    self.img_size,
            channels:    self.img_depth,
            seed:        self.seed,
        }
    }

    pub fn model_config(&self) -> SteeringModelConfig {
        SteeringModelConfig::new()
            .with_img_size(self.img_size)
            .with_img_depth(self.img_depth)
            .with_dropout(self.dropout)
    }

    pub fn checkpoint_manager(&self) -> CheckpointManager {
        CheckpointManager::new(&self.save_path, self.max_to_keep)
    }

    /// Key/value rows for the start-up banner
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("img_depth",     self.img_depth.to_string()),
            ("img_size",      self.img_size.to_string()),
            ("batch_size",    self.batch_size.to_string()),
            ("dropout",       self.dropout.to_string()),
            ("learning_rate", self.learning_rate.to_string()),
            ("log_every",     self.log_every.to_string()),
            ("save_every",    self.save_every.to_string()),
            ("epochs",        self.epochs.to_string()),
            ("log_dir",       self.log_dir.clone()),
            ("data_dir",      self.data_dir.clone()),
            ("save_path",     self.save_path.clone()),
            ("shuffle",       self.shuffle.to_string()),
            ("buffer_size",   self.buffer_size.to_string()),
            ("seed",          self.seed.map_or_else(|| "none".to_string(), |s| s.to_string())),
            ("max_to_keep",   self.max_to_keep.to_string()),
        ]
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run training until the epochs are exhausted or `cancel` fires.
    pub fn execute(&self, cancel: CancellationToken) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Dataset from the simulator log ───────────────────────────
        let manifest = cfg.manifest_path();
        tracing::info!("Reading driving log '{}'", manifest.display());
        let mut dataset = load_data(&manifest, &cfg.image_dir(), cfg.dataset_options())
            .with_context(|| format!("Cannot build dataset from '{}'", manifest.display()))?;
        tracing::info!(
            "{} examples of shape {:?}, {} batches of {} per epoch",
            dataset.len(),
            dataset.example_shape(),
            dataset.num_batches(),
            dataset.options().batch_size
        );

        // ── Step 2: Metrics sink ──────────────────────────────────────────────
        let metrics = CsvMetricsSink::new(&cfg.log_dir)?;
        tracing::info!("Writing summaries to '{}'", metrics.csv_path().display());

        // ── Step 3: Training loop (Layer 5) ───────────────────────────────────
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);

        let mut trainer = Trainer::<MyBackend, _>::new(cfg, metrics, cancel, device);
        trainer.run(&mut dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_derived_paths() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.epochs, 1000);
        assert_eq!(cfg.manifest_path(), PathBuf::from("./simulated_data/driving_log.csv"));
        assert_eq!(cfg.image_dir(), PathBuf::from("./simulated_data/IMG"));

        let opts = cfg.dataset_options();
        assert_eq!(opts.decode, DecodeStrategy::FastPath);
        assert_eq!((opts.img_size, opts.channels), (32, 3));

        let model = cfg.model_config();
        assert_eq!(model.dropout, 0.5);
    }

    #[test]
    fn test_config_serialises() {
        let cfg = TrainConfig { seed: Some(9), ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, Some(9));
        assert_eq!(back.save_path, cfg.save_path);
    }
}
