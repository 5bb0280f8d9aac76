//! Address decomposition for the direct-mapped cache geometry.
//!
//! Every address splits into `tag | index | offset`. It provides:
//! 1. **Field extraction:** `offset`, `index`, and `tag` of an address.
//! 2. **Alignment:** `line_addr` rounds an address down to its line base.
//! 3. **Reconstruction:** `victim_addr` rebuilds the line address of an
//!    evicted line from its stored tag and index.
//!
//! Two addresses alias in a cache iff they share an index; they name the
//! same line iff they also share a tag.

use super::constants::{INDEX_BITS, LINE_SIZE, NUM_LINES, OFFSET_BITS};

/// Returns the byte offset of `addr` within its cache line.
#[inline(always)]
pub fn offset(addr: u32) -> usize {
    (addr as usize) % LINE_SIZE
}

/// Returns the direct-mapped line index for `addr`.
#[inline(always)]
pub fn index(addr: u32) -> usize {
    (addr as usize / LINE_SIZE) % NUM_LINES
}

/// Returns the tag for `addr` (the address bits above index and offset).
#[inline(always)]
pub fn tag(addr: u32) -> u32 {
    addr / (LINE_SIZE * NUM_LINES) as u32
}

/// Rounds `addr` down to the base address of its cache line.
#[inline(always)]
pub fn line_addr(addr: u32) -> u32 {
    addr & !(LINE_SIZE as u32 - 1)
}

/// Reconstructs the line address held by a cache slot from its stored tag
/// and index. Used when a dirty victim must be written back: the victim's
/// full address is not recorded anywhere else.
#[inline(always)]
pub fn victim_addr(tag: u32, index: usize) -> u32 {
    (tag << (INDEX_BITS + OFFSET_BITS)) | ((index as u32) << OFFSET_BITS)
}
