//! Coherence-violation diagnostics.
//!
//! This module defines the error type raised when the protocol state becomes
//! inconsistent. It provides:
//! 1. **Violation representation:** One variant per class of MESI invariant break.
//! 2. **Diagnostics:** Each variant names the line address and the state every
//!    cache holds for it, so a failure is attributable from the message alone.
//! 3. **Error integration:** Implements the standard error traits for
//!    system-level reporting.
//!
//! None of these are recoverable: they indicate a bug in the coherence
//! implementation, and callers are expected to abort with the message.

use std::fmt;

use crate::cache::line::LineState;

/// A violation of the MESI coherence invariants.
///
/// Carried up from `System::step` when the post-snoop state of the caches is
/// inconsistent, or from grant delivery when a transaction finds a line in a
/// state the protocol forbids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoherenceError {
    /// A `BusUpgr` grant arrived at a line that is no longer Shared with the
    /// expected tag.
    ///
    /// An upgrade carries no data, so the requester must still hold the line;
    /// anything else means the request and the snoop pass disagreed.
    UpgradeViolation {
        /// The requesting cache.
        cache_id: usize,
        /// The address being upgraded.
        addr: u32,
        /// The state the line was actually found in.
        state: LineState,
    },

    /// More than one cache holds the same line in an owning state (two
    /// Modified copies, or two Exclusive copies).
    MultipleOwners {
        /// Base address of the offending line.
        addr: u32,
        /// State of the line in every cache, indexed by cache id.
        states: Vec<LineState>,
    },

    /// A cache holds the line in M or E while another cache holds it in any
    /// non-Invalid state.
    OwnerNotExclusive {
        /// Base address of the offending line.
        addr: u32,
        /// The cache holding the line in M or E.
        owner: usize,
        /// State of the line in every cache, indexed by cache id.
        states: Vec<LineState>,
    },
}

fn fmt_states(states: &[LineState]) -> String {
    states
        .iter()
        .enumerate()
        .map(|(id, s)| format!("cache{}={}", id, s))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for CoherenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoherenceError::UpgradeViolation {
                cache_id,
                addr,
                state,
            } => write!(
                f,
                "BusUpgr at cache {} for {:#x} found line in {} (expected S with matching tag)",
                cache_id, addr, state
            ),
            CoherenceError::MultipleOwners { addr, states } => write!(
                f,
                "multiple owning copies of line {:#x}: {}",
                addr,
                fmt_states(states)
            ),
            CoherenceError::OwnerNotExclusive {
                addr,
                owner,
                states,
            } => write!(
                f,
                "cache {} owns line {:#x} but other copies exist: {}",
                owner,
                addr,
                fmt_states(states)
            ),
        }
    }
}

impl std::error::Error for CoherenceError {}
