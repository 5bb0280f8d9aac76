//! Simulation front-end utilities.
//!
//! This module holds the pieces that sit between the command line and the
//! simulated system, currently the trace-file loader.

/// Plain-text trace-file parsing.
pub mod loader;
