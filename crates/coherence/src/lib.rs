//! MESI snooping-bus coherence simulator library.
//!
//! This crate implements a cycle-stepped model of a shared-bus multiprocessor with the following:
//! 1. **Caches:** Per-core private, direct-mapped, write-allocate caches running the MESI protocol.
//! 2. **Bus:** A single-slot atomic arbiter with round-robin fairness and same-cycle snoop resolution.
//! 3. **System:** A five-phase per-cycle scheduler that orders cores, caches, bus, and memory
//!    deterministically and asserts the global MESI invariants on every transaction.
//! 4. **Cores:** Trace players issuing ordered load/store operations.
//! 5. **Simulation:** Trace loading, configuration, and statistics collection.

/// Per-core cache and MESI state machine.
pub mod cache;
/// Common types and constants (address geometry, errors).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures).
pub mod config;
/// Trace-player core.
pub mod core;
/// Trace loading utilities.
pub mod sim;
/// System assembly (scheduler, bus, memory).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Coherence-violation diagnostics carried out of `System::step`.
pub use crate::common::error::CoherenceError;
/// Accumulated simulation counters.
pub use crate::stats::SimStats;
/// Top-level system (cores, caches, bus, memory); construct with `System::new`.
pub use crate::soc::System;
