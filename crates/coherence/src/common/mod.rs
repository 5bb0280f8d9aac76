//! Common types and constants shared across the simulator.
//!
//! This module collects the pieces every other component depends on:
//! 1. **Address geometry:** Offset/index/tag decomposition for the fixed cache shape.
//! 2. **Constants:** Line size, line count, and the derived bit widths.
//! 3. **Errors:** Protocol-violation diagnostics raised by the coherence checker.

/// Address decomposition helpers for the fixed direct-mapped geometry.
pub mod addr;
/// Compile-time cache geometry constants.
pub mod constants;
/// Coherence-violation error types and diagnostics.
pub mod error;
