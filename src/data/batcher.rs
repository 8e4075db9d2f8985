// ============================================================
// Layer 4 — Steering Batcher
// ============================================================
// Stacks a Batch of decoded examples into tensors for the model.
//
// How batching works here:
//   Input:  N examples, each an HWC buffer of H*W*C floats
//   Output: images  [N, H, W, C]
//           targets [N, 1]
//
// Every example in a dataset has the same shape, so the buffers
// are simply concatenated and reshaped.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{prelude::*, tensor::TensorData};

use crate::data::error::{DatasetError, DatasetResult};
use crate::domain::example::Batch;

/// A batch ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SteeringBatch<B: Backend> {
    /// Camera frames — shape: [batch_size, height, width, channels]
    pub images: Tensor<B, 4>,

    /// Steering angles — shape: [batch_size, 1]
    pub targets: Tensor<B, 2>,
}

/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct SteeringBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SteeringBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Images only — used for unlabeled data and inference.
    pub fn images(&self, batch: &Batch) -> DatasetResult<Tensor<B, 4>> {
        let [h, w, c] = batch
            .image_shape()
            .ok_or_else(|| DatasetError::Config("cannot stack an empty batch".into()))?;

        let flat: Vec<f32> = batch
            .examples
            .iter()
            .flat_map(|e| e.image.iter().copied())
            .collect();

        Ok(Tensor::from_data(
            TensorData::new(flat, [batch.len(), h, w, c]),
            &self.device,
        ))
    }

    /// Images and steering targets for a training step.
    pub fn batch(&self, batch: &Batch) -> DatasetResult<SteeringBatch<B>> {
        let labels = batch
            .labels()
            .ok_or(DatasetError::MissingLabels { count: batch.len() })?;
        let images = self.images(batch)?;

        let targets = Tensor::from_data(TensorData::new(labels, [batch.len(), 1]), &self.device);

        Ok(SteeringBatch { images, targets })
    }
}
