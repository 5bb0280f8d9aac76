//! Compile-time cache geometry.
//!
//! The cache shape is fixed at compile time: 32-byte lines, 32 lines per
//! cache, direct-mapped. Everything that decomposes an address (the caches,
//! the memory model, the invariant checker) derives its arithmetic from
//! these four values.

/// Cache line size in bytes. The unit of transfer and coherence tracking.
pub const LINE_SIZE: usize = 32;

/// Number of lines per cache. Direct-mapped, so this is also the set count.
pub const NUM_LINES: usize = 32;

/// Bits consumed by the byte offset within a line (`log2(LINE_SIZE)`).
pub const OFFSET_BITS: u32 = 5;

/// Bits consumed by the line index (`log2(NUM_LINES)`).
pub const INDEX_BITS: u32 = 5;
