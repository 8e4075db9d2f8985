// ============================================================
// Layer 4 — Dataset Assembly
// ============================================================
// A Dataset is a factory of passes. Every call to `iter()` hands
// out a fresh, finite Batches iterator:
//
//   raw (path, label) records
//       │
//       ▼
//   windowed shuffle of record indices   (if shuffle = true)
//       │
//       ▼
//   take `batch_size` indices
//       │
//       ▼
//   decode each image (rayon, order preserved)
//       │
//       ▼
//   Batch
//
// Nothing is decoded until a batch is pulled, so a corrupt file
// surfaces as an Err item from the pass that reaches it.
// The last batch keeps the remainder (no drop, no padding).
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    decode::{DecodeStrategy, ImageDecoder},
    error::{DatasetError, DatasetResult},
    shuffle::WindowedShuffle,
};
use crate::domain::example::{Batch, Example};

// ─── Options ──────────────────────────────────────────────────────────────────
/// Knobs of `make_dataset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOptions {
    pub shuffle: bool,
    /// Size of the shuffle window
    pub buffer_size: usize,
    pub batch_size: usize,
    /// Which decoder turns paths into tensors
    pub decode: DecodeStrategy,
    /// Expected side length for the fast path
    pub img_size: usize,
    /// Expected channel count for the fast path
    pub channels: usize,
    /// Seed for the per-pass shuffle order; None draws from entropy
    pub seed: Option<u64>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            shuffle: true,
            buffer_size: 1000,
            batch_size: 128,
            decode: DecodeStrategy::FastPath,
            img_size: 32,
            channels: 3,
            seed: None,
        }
    }
}

/// An image path paired with its (optional) label, not yet decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExample {
    pub path: PathBuf,
    pub label: Option<f32>,
}

// ─── Dataset ──────────────────────────────────────────────────────────────────
pub struct Dataset {
    records: Arc<[RawExample]>,
    decoder: Arc<dyn ImageDecoder>,
    options: DatasetOptions,
    /// Draws one seed per pass so every epoch sees a new order
    pass_rng: StdRng,
    passes: usize,
}

/// Build a dataset from image paths and optional labels.
///
/// `labels[i]` belongs to `features[i]`; the pairing survives
/// shuffling and batching.
pub fn make_dataset(
    features: Vec<PathBuf>,
    labels: Option<Vec<f32>>,
    options: DatasetOptions,
) -> DatasetResult<Dataset> {
    if options.batch_size == 0 {
        return Err(DatasetError::Config("batch_size must be at least 1".into()));
    }
    if options.buffer_size == 0 {
        return Err(DatasetError::Config("buffer_size must be at least 1".into()));
    }
    // Labeled frames feed the model at their native shape; unlabeled
    // frames of any resolution go through the grayscale resize.
    match (&labels, options.decode) {
        (Some(_), DecodeStrategy::Fallback) => {
            return Err(DatasetError::Config(
                "labeled data must use the fast-path decoder".into(),
            ));
        }
        (None, DecodeStrategy::FastPath) => {
            return Err(DatasetError::Config(
                "unlabeled data must use the fallback decoder".into(),
            ));
        }
        _ => {}
    }

    let records: Vec<RawExample> = match labels {
        Some(labels) => {
            if labels.len() != features.len() {
                return Err(DatasetError::Schema(format!(
                    "{} features but {} labels",
                    features.len(),
                    labels.len()
                )));
            }
            features
                .into_iter()
                .zip(labels)
                .map(|(path, label)| RawExample { path, label: Some(label) })
                .collect()
        }
        None => features
            .into_iter()
            .map(|path| RawExample { path, label: None })
            .collect(),
    };

    let decoder = options.decode.decoder(options.img_size, options.channels)?;
    let pass_rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::debug!(
        "Dataset ready: {} examples, decode={:?}, shape={:?}, batch_size={}, shuffle={} (buffer {})",
        records.len(),
        options.decode,
        decoder.output_shape(),
        options.batch_size,
        options.shuffle,
        options.buffer_size,
    );

    Ok(Dataset {
        records: records.into(),
        decoder,
        options,
        pass_rng,
        passes: 0,
    })
}

impl Dataset {
    /// Number of examples in one full pass
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Batches per pass, counting a short final batch
    pub fn num_batches(&self) -> usize {
        self.records.len().div_ceil(self.options.batch_size)
    }

    /// Shape every decoded image will have
    pub fn example_shape(&self) -> [usize; 3] {
        self.decoder.output_shape()
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    pub fn is_labeled(&self) -> bool {
        self.records.iter().all(|r| r.label.is_some())
    }

    /// Number of passes handed out so far
    #[cfg(test)]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Start a fresh pass. Shuffling is re-applied on every call.
    pub fn iter(&mut self) -> Batches {
        self.passes += 1;
        let indices = 0..self.records.len();

        let order: Box<dyn Iterator<Item = usize> + Send> = if self.options.shuffle {
            let rng = StdRng::seed_from_u64(self.pass_rng.gen());
            Box::new(WindowedShuffle::new(indices, self.options.buffer_size, rng))
        } else {
            Box::new(indices)
        };

        Batches {
            order,
            records: Arc::clone(&self.records),
            decoder: Arc::clone(&self.decoder),
            batch_size: self.options.batch_size,
            failed: false,
        }
    }
}

// ─── Batches ──────────────────────────────────────────────────────────────────
/// One finite pass over a dataset. `None` marks the end of the epoch.
pub struct Batches {
    order: Box<dyn Iterator<Item = usize> + Send>,
    records: Arc<[RawExample]>,
    decoder: Arc<dyn ImageDecoder>,
    batch_size: usize,
    failed: bool,
}

impl Iterator for Batches {
    type Item = DatasetResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let indices: Vec<usize> = self.order.by_ref().take(self.batch_size).collect();
        if indices.is_empty() {
            return None;
        }

        let records = &self.records;
        let decoder = &self.decoder;
        let shape = decoder.output_shape();

        // par_iter keeps the index order when collecting
        let decoded: DatasetResult<Vec<Example>> = indices
            .par_iter()
            .map(|&i| {
                let raw = &records[i];
                decoder
                    .decode(&raw.path)
                    .map(|image| Example::new(image, shape, raw.label))
            })
            .collect();

        match decoded {
            Ok(examples) => Some(Ok(Batch::new(examples))),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
