// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The Burn-specific core of the trainer.
//
// What's in this layer:
//
//   model.rs      — The end-to-end steering CNN
//                   • 5 convolutions (same padding, ELU)
//                   • Dropout on the flattened features
//                   • 3 dense layers (ELU) + linear output
//
//   loss.rs       — Mean squared error over the batch
//
//   trainer.rs    — The training state machine
//                   Restore-or-init, epoch loop, RMSProp step,
//                   periodic summaries and checkpoints,
//                   interrupt save
//
//   inferencer.rs — Loads the latest checkpoint and predicts
//                   the steering angle for one frame
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Bojarski et al. (2016) End to End Learning for Self-Driving Cars

/// Steering-angle CNN
pub mod model;

/// MSE loss
pub mod loss;

/// Training loop with checkpointing and interrupt handling
pub mod trainer;

/// Inference engine — loads checkpoint and predicts an angle
pub mod inferencer;
