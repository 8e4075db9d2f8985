// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the simulator's CSV log to tensor batches.
//
//   driving_log.csv
//       │
//       ▼
//   loader       → parses rows, resolves img_center paths
//       │
//       ▼
//   dataset      → (path, label) records, per-pass factory
//       │
//       ▼
//   shuffle      → windowed shuffle of record order
//       │
//       ▼
//   decode       → FastPath / Fallback image decoders
//       │
//       ▼
//   batcher      → stacks examples into [N, H, W, C] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Error taxonomy shared by the pipeline stages
pub mod error;

/// Reads driving_log.csv and builds datasets
pub mod loader;

/// Fast-path and fallback image decoders
pub mod decode;

/// Bounded-buffer shuffle
pub mod shuffle;

/// Dataset factory and per-pass batch iterator
pub mod dataset;

/// Turns batches into Burn tensors
pub mod batcher;

#[cfg(test)]
pub(crate) mod fixtures;
