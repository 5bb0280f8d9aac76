//! Cache line storage and MESI state.

use std::fmt;

use crate::common::addr;
use crate::common::constants::LINE_SIZE;

/// MESI coherence state of one cache line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineState {
    /// Line is absent; tag and data are meaningless.
    Invalid,
    /// Clean copy; other caches may hold the line too.
    Shared,
    /// Clean copy and provably the only one in the system.
    Exclusive,
    /// Dirty copy; this cache owns the only valid data.
    Modified,
}

impl LineState {
    /// Single-letter form used in diagnostics ('I', 'S', 'E', 'M').
    pub fn letter(self) -> char {
        match self {
            LineState::Invalid => 'I',
            LineState::Shared => 'S',
            LineState::Exclusive => 'E',
            LineState::Modified => 'M',
        }
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One direct-mapped cache slot: tag, MESI state, and the line bytes.
///
/// While `state` is `Invalid` the tag and data are semantically undefined
/// and must never be consulted; [`CacheLine::holds`] encodes that rule.
#[derive(Clone, Copy)]
pub struct CacheLine {
    /// Tag of the line currently installed.
    pub tag: u32,
    /// MESI state.
    pub state: LineState,
    /// Line contents.
    pub data: [u8; LINE_SIZE],
}

impl Default for CacheLine {
    fn default() -> Self {
        Self {
            tag: 0,
            state: LineState::Invalid,
            data: [0; LINE_SIZE],
        }
    }
}

impl CacheLine {
    /// Whether this slot currently holds the line containing `a`.
    pub fn holds(&self, a: u32) -> bool {
        self.state != LineState::Invalid && self.tag == addr::tag(a)
    }

    /// Whether this slot currently holds a valid line with the given tag.
    pub fn holds_tag(&self, tag: u32) -> bool {
        self.state != LineState::Invalid && self.tag == tag
    }
}
