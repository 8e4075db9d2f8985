// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the training loop:
//
//   checkpoint.rs  — model + optimizer persistence tagged with the
//                    global step, checkpoint.json index, pruning
//                    of old steps.
//
//   metrics.rs     — scalar summaries appended to a CSV file.
//
//   interrupt.rs   — cancellation token and the Ctrl-C listener.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Training state saving and loading
pub mod checkpoint;

/// Scalar summaries CSV sink
pub mod metrics;

/// Cooperative cancellation
pub mod interrupt;
