// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the core
// concepts of the trainer:
//
//   manifest.rs  — one row of the simulator's driving log
//   example.rs   — decoded (image, label) pairs and batches
//   state.rs     — persisted training state + loop phases
//   traits.rs    — seams other layers implement
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One row of driving_log.csv
pub mod manifest;

// Examples and batches produced by the data pipeline
pub mod example;

// Global step + training state machine phases
pub mod state;

// Core abstractions (traits) that other layers implement
pub mod traits;
