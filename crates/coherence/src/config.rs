//! Configuration system for the coherence simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! simulated system. It provides:
//! 1. **Defaults:** Baseline hardware constants (core count, latencies, memory size).
//! 2. **Structures:** Hierarchical config for general, system, and memory settings.
//! 3. **Deserialization:** All structures deserialize from JSON with per-field
//!    defaults, so a config file only needs to name what it overrides.
//!
//! The cache geometry itself (line size, line count) is compile-time and lives
//! in [`crate::common::constants`]; only run-time parameters appear here.

use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values define the baseline configuration when not explicitly
/// overridden in a JSON configuration file.
mod defaults {
    /// Default number of cores (and therefore private caches).
    pub const NUM_CORES: usize = 2;

    /// Cycles between a bus grant and the completion of the requesting
    /// operation, emulating memory or peer-to-peer transfer latency.
    pub const COMPLETION_LATENCY: u32 = 5;

    /// Total size of main memory (1 MiB).
    ///
    /// Accesses beyond this bound are fatal; traces address a flat byte
    /// space starting at zero.
    pub const MEMORY_SIZE: usize = 1024 * 1024;

    /// Default cycle bound for the run loop.
    pub const MAX_CYCLES: u64 = 10_000;
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use coherence::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.system.num_cores, 2);
/// assert_eq!(config.system.completion_latency, 5);
/// ```
///
/// Deserializing a partial override from JSON:
///
/// ```
/// use coherence::config::Config;
///
/// let json = r#"{
///     "general": { "trace_protocol": true },
///     "system": { "num_cores": 4 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.system.num_cores, 4);
/// assert_eq!(config.memory.size_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Core count and protocol timing.
    #[serde(default)]
    pub system: SystemConfig,
    /// Main memory configuration.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Emit a per-cycle protocol trace through the `log` facade.
    ///
    /// Replaces ad-hoc print toggles: tracing is configured per system at
    /// construction, never through process-wide state.
    #[serde(default)]
    pub trace_protocol: bool,

    /// Cycle bound for `run` when the caller does not supply one.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_protocol: false,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// Core count and protocol timing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Number of cores; each core owns one private cache.
    #[serde(default = "SystemConfig::default_num_cores")]
    pub num_cores: usize,

    /// Bus-mediated completion latency in cycles.
    #[serde(default = "SystemConfig::default_completion_latency")]
    pub completion_latency: u32,
}

impl SystemConfig {
    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    fn default_completion_latency() -> u32 {
        defaults::COMPLETION_LATENCY
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
            completion_latency: defaults::COMPLETION_LATENCY,
        }
    }
}

/// Main memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Backing store size in bytes.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: usize,
}

impl MemoryConfig {
    fn default_size() -> usize {
        defaults::MEMORY_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_SIZE,
        }
    }
}
