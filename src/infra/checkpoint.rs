// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the training state using Burn's CompactRecorder.
//
// What gets saved per checkpoint (tagged with the global step):
//   1. Model weights      <stem>-<step>.mpk.gz
//   2. Optimizer state    <stem>-<step>-optim.mpk.gz
//   3. checkpoint.json    latest step, retained steps, model config
//
// <stem> is the file stem of `save_path`, and the directory is its
// parent. With the default save_path:
//
//   saved/models/
//     nvidia-10.mpk.gz
//     nvidia-10-optim.mpk.gz
//     nvidia-20.mpk.gz
//     nvidia-20-optim.mpk.gz
//     checkpoint.json
//
// Only the `max_to_keep` most recent steps stay on disk.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use burn::{
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder, RecorderError},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::domain::state::TrainingState;
use crate::ml::model::{SteeringModel, SteeringModelConfig};

/// Name of the index file inside the checkpoint directory
pub const INDEX_FILENAME: &str = "checkpoint.json";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("no checkpoint index at {path}")]
    MissingIndex { path: PathBuf },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable checkpoint index {path}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("recorder failed for {path}: {source}")]
    Recorder {
        path: PathBuf,
        #[source]
        source: RecorderError,
    },

    #[error("checkpoint was written for a {found} model, current model is {expected}")]
    ConfigMismatch { expected: String, found: String },
}

/// Contents of checkpoint.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointIndex {
    /// Step of the most recent save
    pub latest_step: u64,
    /// Steps still on disk, oldest first
    pub steps: Vec<u64>,
    /// Hyper-parameters the weights were trained with
    pub model: SteeringModelConfig,
}

/// A model and optimizer brought back from disk.
pub struct Restored<M, O> {
    pub state: TrainingState,
    pub model: M,
    pub optim: O,
}

/// Manages saving and loading of training checkpoints.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
    stem: String,
    max_to_keep: usize,
}

impl CheckpointManager {
    /// `save_path` names the checkpoint prefix, e.g. `saved/models/nvidia.ckpt`.
    /// Nothing is created on disk until the first save.
    pub fn new(save_path: impl AsRef<Path>, max_to_keep: usize) -> Self {
        let save_path = save_path.as_ref();
        let dir = match save_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // The recorder rewrites extensions, so keep the stem dot-free
        let stem = save_path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.replace('.', "_"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "model".to_string());

        Self { dir, stem, max_to_keep: max_to_keep.max(1) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the checkpoint directory exists at all
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// `mkdir -p` the checkpoint directory
    pub fn ensure_dir(&self) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir).map_err(|source| CheckpointError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    fn model_path(&self, step: u64) -> PathBuf {
        self.dir.join(format!("{}-{step}", self.stem))
    }

    fn optim_path(&self, step: u64) -> PathBuf {
        self.dir.join(format!("{}-{step}-optim", self.stem))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILENAME)
    }

    /// Persist model + optimizer state tagged with `state.global_step`.
    pub fn save<B, O>(
        &self,
        state: TrainingState,
        model: &SteeringModel<B>,
        optim: &O,
        model_cfg: &SteeringModelConfig,
    ) -> Result<PathBuf, CheckpointError>
    where
        B: AutodiffBackend,
        O: Optimizer<SteeringModel<B>, B>,
    {
        self.ensure_dir()?;
        let step = state.global_step;
        let recorder = CompactRecorder::new();

        let model_path = self.model_path(step);
        recorder
            .record(model.clone().into_record(), model_path.clone())
            .map_err(|source| CheckpointError::Recorder { path: model_path.clone(), source })?;

        let optim_path = self.optim_path(step);
        Recorder::<B>::record(&recorder, optim.to_record(), optim_path.clone())
            .map_err(|source| CheckpointError::Recorder { path: optim_path, source })?;

        // Update the index last so it never points at a half-written step
        let mut steps = match self.read_index() {
            Ok(index) => index.steps,
            Err(CheckpointError::MissingIndex { .. }) => self.scan_steps(),
            Err(e) => {
                tracing::warn!("Rebuilding checkpoint index from directory listing: {}", e);
                self.scan_steps()
            }
        };
        steps.retain(|s| *s != step);
        steps.push(step);

        let pruned: Vec<u64> = if steps.len() > self.max_to_keep {
            steps.drain(..steps.len() - self.max_to_keep).collect()
        } else {
            Vec::new()
        };

        self.write_index(&CheckpointIndex {
            latest_step: step,
            steps,
            model: model_cfg.clone(),
        })?;

        for old in pruned {
            self.remove_step(old);
        }

        tracing::debug!("Saved checkpoint: step {} → '{}'", step, model_path.display());
        Ok(model_path)
    }

    /// Load the latest model + optimizer state into the given fresh instances.
    pub fn restore<B, O>(
        &self,
        model: SteeringModel<B>,
        optim: O,
        model_cfg: &SteeringModelConfig,
        device: &B::Device,
    ) -> Result<Restored<SteeringModel<B>, O>, CheckpointError>
    where
        B: AutodiffBackend,
        O: Optimizer<SteeringModel<B>, B>,
    {
        let index = self.read_index()?;
        check_architecture(model_cfg, &index.model)?;
        let step = index.latest_step;
        let recorder = CompactRecorder::new();

        let model_path = self.model_path(step);
        let model_record = recorder
            .load(model_path.clone(), device)
            .map_err(|source| CheckpointError::Recorder { path: model_path, source })?;

        let optim_path = self.optim_path(step);
        let optim_record = Recorder::<B>::load(&recorder, optim_path.clone(), device)
            .map_err(|source| CheckpointError::Recorder { path: optim_path, source })?;

        Ok(Restored {
            state: TrainingState::at_step(step),
            model: model.load_record(model_record),
            optim: optim.load_record(optim_record),
        })
    }

    /// Load only the latest weights, for inference on any backend.
    pub fn load_model<B: Backend>(
        &self,
        model: SteeringModel<B>,
        model_cfg: &SteeringModelConfig,
        device: &B::Device,
    ) -> Result<(SteeringModel<B>, u64), CheckpointError> {
        let index = self.read_index()?;
        check_architecture(model_cfg, &index.model)?;

        let path = self.model_path(index.latest_step);
        tracing::info!("Loading checkpoint from step {}", index.latest_step);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .map_err(|source| CheckpointError::Recorder { path, source })?;

        Ok((model.load_record(record), index.latest_step))
    }

    /// Read checkpoint.json. Errors if training has never saved.
    pub fn read_index(&self) -> Result<CheckpointIndex, CheckpointError> {
        let path = self.index_path();
        if !path.is_file() {
            return Err(CheckpointError::MissingIndex { path });
        }
        let json = fs::read_to_string(&path)
            .map_err(|source| CheckpointError::Io { path: path.clone(), source })?;
        serde_json::from_str(&json).map_err(|source| CheckpointError::Index { path, source })
    }

    fn write_index(&self, index: &CheckpointIndex) -> Result<(), CheckpointError> {
        let path = self.index_path();
        let json = serde_json::to_string_pretty(index)
            .map_err(|source| CheckpointError::Index { path: path.clone(), source })?;
        fs::write(&path, json).map_err(|source| CheckpointError::Io { path, source })
    }

    /// Steps with weight or optimizer files in the directory, oldest first
    fn scan_steps(&self) -> Vec<u64> {
        let prefix = format!("{}-", self.stem);
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut steps: Vec<u64> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_owned))
            .filter_map(|name| {
                let rest = name.strip_prefix(&prefix)?;
                let end = rest.find(|c: char| c == '.' || c == '-')?;
                rest[..end].parse().ok()
            })
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }

    /// Every file written for `step`, whatever extension the recorder used
    pub fn files_for_step(&self, step: u64) -> Vec<PathBuf> {
        let model_prefix = format!("{}-{step}.", self.stem);
        let optim_prefix = format!("{}-{step}-optim.", self.stem);

        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&model_prefix) || n.starts_with(&optim_prefix))
            })
            .collect();
        files.sort();
        files
    }

    fn remove_step(&self, step: u64) {
        for path in self.files_for_step(step) {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("Could not remove old checkpoint '{}': {}", path.display(), e);
            }
        }
        tracing::debug!("Pruned checkpoint for step {}", step);
    }
}

fn check_architecture(
    expected: &SteeringModelConfig,
    found: &SteeringModelConfig,
) -> Result<(), CheckpointError> {
    if expected.same_architecture(found) {
        Ok(())
    } else {
        Err(CheckpointError::ConfigMismatch {
            expected: expected.describe(),
            found: found.describe(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::{RmsPropConfig, SgdConfig};

    type TestBackend = Autodiff<NdArray>;

    fn small_cfg() -> SteeringModelConfig {
        SteeringModelConfig::new().with_img_size(4)
    }

    fn fresh(cfg: &SteeringModelConfig) -> SteeringModel<TestBackend> {
        cfg.init(&Default::default())
    }

    #[test]
    fn test_paths_from_save_path() {
        let m = CheckpointManager::new("saved/models/nvidia.ckpt", 5);
        assert_eq!(m.dir(), Path::new("saved/models"));
        assert_eq!(m.model_path(10), PathBuf::from("saved/models/nvidia-10"));
        assert_eq!(m.optim_path(10), PathBuf::from("saved/models/nvidia-10-optim"));

        let bare = CheckpointManager::new("weights", 5);
        assert_eq!(bare.dir(), Path::new("."));
    }

    #[test]
    fn test_save_then_restore_keeps_step() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("ckpt/nvidia.ckpt"), 5);
        assert!(!mgr.exists());

        let cfg = small_cfg();
        let optim = RmsPropConfig::new().init::<TestBackend, SteeringModel<TestBackend>>();
        mgr.save(TrainingState::at_step(12), &fresh(&cfg), &optim, &cfg).unwrap();
        assert!(mgr.exists());
        assert!(!mgr.files_for_step(12).is_empty());

        let restored = mgr
            .restore(
                fresh(&cfg),
                RmsPropConfig::new().init::<TestBackend, SteeringModel<TestBackend>>(),
                &cfg,
                &Default::default(),
            )
            .unwrap();
        assert_eq!(restored.state.global_step, 12);
    }

    #[test]
    fn test_missing_index() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 5);
        let cfg = small_cfg();
        let result = mgr.restore(
            fresh(&cfg),
            SgdConfig::new().init::<TestBackend, SteeringModel<TestBackend>>(),
            &cfg,
            &Default::default(),
        );
        assert!(matches!(result, Err(CheckpointError::MissingIndex { .. })));
    }

    #[test]
    fn test_corrupt_weights_fail_to_load() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 5);
        let cfg = small_cfg();
        let optim = SgdConfig::new().init::<TestBackend, SteeringModel<TestBackend>>();
        mgr.save(TrainingState::at_step(3), &fresh(&cfg), &optim, &cfg).unwrap();

        for path in mgr.files_for_step(3) {
            fs::write(path, b"truncated").unwrap();
        }

        let result = mgr.restore(fresh(&cfg), optim, &cfg, &Default::default());
        assert!(matches!(result, Err(CheckpointError::Recorder { .. })));
    }

    #[test]
    fn test_architecture_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 5);
        let cfg = small_cfg();
        let optim = SgdConfig::new().init::<TestBackend, SteeringModel<TestBackend>>();
        mgr.save(TrainingState::at_step(1), &fresh(&cfg), &optim, &cfg).unwrap();

        let other = SteeringModelConfig::new().with_img_size(6);
        let result = mgr.restore(fresh(&other), optim, &other, &Default::default());
        assert!(matches!(result, Err(CheckpointError::ConfigMismatch { .. })));
    }

    #[test]
    fn test_only_latest_steps_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 2);
        let cfg = small_cfg();
        let model = fresh(&cfg);
        let optim = SgdConfig::new().init::<TestBackend, SteeringModel<TestBackend>>();

        for step in [10, 20, 30] {
            mgr.save(TrainingState::at_step(step), &model, &optim, &cfg).unwrap();
        }

        assert_eq!(mgr.read_index().unwrap().steps, vec![20, 30]);
        assert_eq!(mgr.read_index().unwrap().latest_step, 30);
        assert!(mgr.files_for_step(10).is_empty());
        assert!(!mgr.files_for_step(20).is_empty());
    }

    #[test]
    fn test_unreadable_index_still_prunes_old_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 2);
        let cfg = small_cfg();
        let model = fresh(&cfg);
        let optim = SgdConfig::new().init::<TestBackend, SteeringModel<TestBackend>>();

        for step in [10, 20] {
            mgr.save(TrainingState::at_step(step), &model, &optim, &cfg).unwrap();
        }
        fs::write(mgr.index_path(), b"{ not json").unwrap();
        assert!(matches!(mgr.read_index(), Err(CheckpointError::Index { .. })));

        mgr.save(TrainingState::at_step(30), &model, &optim, &cfg).unwrap();
        assert_eq!(mgr.read_index().unwrap().steps, vec![20, 30]);
        assert!(mgr.files_for_step(10).is_empty());
        assert!(!mgr.files_for_step(20).is_empty());
    }

    #[test]
    fn test_scan_ignores_unrelated_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 5);
        let names = [
            "nvidia-7.mpk.gz",
            "nvidia-7-optim.mpk.gz",
            "nvidia-12.mpk.gz",
            "other-3.mpk.gz",
            "nvidia-x.mpk.gz",
            INDEX_FILENAME,
        ];
        for name in names {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        assert_eq!(mgr.scan_steps(), vec![7, 12]);
    }

    #[test]
    fn test_resaving_a_step_does_not_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("nvidia.ckpt"), 5);
        let cfg = small_cfg();
        let model = fresh(&cfg);
        let optim = SgdConfig::new().init::<TestBackend, SteeringModel<TestBackend>>();

        mgr.save(TrainingState::at_step(4), &model, &optim, &cfg).unwrap();
        mgr.save(TrainingState::at_step(4), &model, &optim, &cfg).unwrap();
        assert_eq!(mgr.read_index().unwrap().steps, vec![4]);
    }
}
