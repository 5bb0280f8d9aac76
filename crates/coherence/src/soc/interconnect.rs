//! Shared snooping bus.
//!
//! This module implements the single-slot atomic arbiter at the center of the
//! system. It provides:
//! 1. **Request slot:** At most one transaction in flight at any cycle boundary;
//!    `request` refuses a second while one is pending.
//! 2. **Grant emission:** `step` drains the slot and hands the stored request
//!    back so the scheduler can run the snoop broadcast in the same cycle.
//! 3. **Grant packet:** The per-transaction carrier for the peer-accumulated
//!    `shared`/`flush` flags and the line bytes the requester installs.
//!
//! Refusal is the normal contention signal, never an error; refused callers
//! retry on a later cycle under round-robin arbitration.

use crate::common::constants::LINE_SIZE;

/// The kind of a bus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusKind {
    /// Read miss; resolves to E if no peer holds the line, S otherwise.
    BusRd,
    /// Read for ownership (write miss); invalidates every peer copy.
    BusRdX,
    /// S-to-M upgrade; invalidates peers and carries no data.
    BusUpgr,
}

/// A transaction placed on the bus by a cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusRequest {
    /// The requesting cache.
    pub cache_id: usize,
    /// Transaction kind.
    pub kind: BusKind,
    /// Target byte address (the whole containing line is transferred).
    pub addr: u32,
}

/// The resolved transaction delivered back to the requesting cache.
///
/// `shared` and `flush` start false and are OR-folded from the snoop results
/// of every peer; `data` is filled by the scheduler from a dirty peer's line
/// or from main memory before delivery.
#[derive(Clone, Copy, Debug)]
pub struct BusGrant {
    /// The originating request.
    pub req: BusRequest,
    /// Some peer held the line; a BusRd installer lands in S instead of E.
    pub shared: bool,
    /// Some peer held the line dirty; its bytes were written back to memory.
    pub flush: bool,
    /// Line bytes for the requester to install (BusRd/BusRdX only).
    pub data: [u8; LINE_SIZE],
}

impl BusGrant {
    /// Creates a grant for `req` with cleared flags and zeroed data.
    pub fn new(req: BusRequest) -> Self {
        Self {
            req,
            shared: false,
            flush: false,
            data: [0; LINE_SIZE],
        }
    }
}

/// Single-slot atomic bus arbiter.
#[derive(Default)]
pub struct Bus {
    slot: Option<BusRequest>,
}

impl Bus {
    /// Creates an idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to place `req` on the bus.
    ///
    /// # Returns
    ///
    /// `false` if a transaction is already pending; the caller must cancel
    /// its acceptance and retry on a later cycle.
    pub fn request(&mut self, req: BusRequest) -> bool {
        if self.slot.is_some() {
            return false;
        }
        log::trace!(
            "bus: {:?} for {:#x} accepted from cache {}",
            req.kind,
            req.addr,
            req.cache_id
        );
        self.slot = Some(req);
        true
    }

    /// Drains the pending transaction, if any.
    ///
    /// The slot is cleared in the same cycle; the scheduler resolves the snoop
    /// broadcast and delivers the grant before any cache can issue again.
    pub fn step(&mut self) -> Option<BusRequest> {
        self.slot.take()
    }

    /// Whether a transaction is pending.
    pub fn is_busy(&self) -> bool {
        self.slot.is_some()
    }
}
