//! Per-core private cache and MESI state machine.
//!
//! This module implements the write-allocate, direct-mapped data cache
//! attached to each core. It provides:
//! 1. **Local transitions:** Classifying core requests as hits or misses and
//!    choosing the bus transaction (BusRd, BusRdX, BusUpgr) a miss or upgrade
//!    requires.
//! 2. **Snoop transitions:** Downgrading or invalidating the local copy in
//!    response to peer traffic, and exposing dirty data for forwarding.
//! 3. **Grant handling:** Victim eviction (with dirty writeback), line
//!    installation, and the post-transaction state.
//! 4. **Service slot:** A single outstanding request per cache, modeled as a
//!    tagged state so an in-flight request is either waiting for the bus or
//!    counting down to completion, never both.

/// Cache line storage and MESI state.
pub mod line;

use self::line::{CacheLine, LineState};
use crate::common::addr;
use crate::common::constants::NUM_LINES;
use crate::common::error::CoherenceError;
use crate::core::{MemOp, OpKind};
use crate::soc::interconnect::{Bus, BusGrant, BusKind, BusRequest};
use crate::soc::memory::MainMemory;
use crate::stats::SimStats;

/// Completion latency for requests serviced without the bus.
const HIT_LATENCY: u32 = 1;

/// Progress of the single request a cache may have in service.
#[derive(Clone, Copy, Debug)]
pub enum ServiceState {
    /// No request in service.
    Idle,
    /// A bus transaction has been issued; the countdown starts at the grant.
    WaitingForBus {
        /// The operation being serviced.
        op: MemOp,
        /// The core that issued it.
        core_id: usize,
    },
    /// The request is counting down to completion.
    Completing {
        /// The operation being serviced.
        op: MemOp,
        /// The core that issued it.
        core_id: usize,
        /// Cycles until the data action runs and the core is notified.
        cycles_left: u32,
    },
}

/// A finished memory operation, returned up the call stack for the scheduler
/// to dispatch to the owning core.
#[derive(Clone, Copy, Debug)]
pub struct Completion {
    /// Core to notify.
    pub core_id: usize,
    /// Load value (byte, zero-extended); echoes the payload for stores.
    pub value: u32,
}

/// What a snooping cache observed for a peer's bus transaction.
///
/// Snoopers return these and the scheduler folds them into the grant; the
/// grant is never mutated mid-broadcast.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnoopResult {
    /// The snooper held the line in S, E, or M.
    pub had_line: bool,
    /// The snooper held the line in M.
    pub was_dirty: bool,
    /// The dirty line bytes, present iff `was_dirty`.
    pub data: Option<[u8; crate::common::constants::LINE_SIZE]>,
}

/// A private, direct-mapped, write-allocate cache with MESI coherence.
pub struct Cache {
    id: usize,
    lines: [CacheLine; NUM_LINES],
    service: ServiceState,
    completion_latency: u32,
}

impl Cache {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `id` - Cache id, equal to the owning core's id.
    /// * `completion_latency` - Cycles between a bus grant and completion.
    pub fn new(id: usize, completion_latency: u32) -> Self {
        Self {
            id,
            lines: [CacheLine::default(); NUM_LINES],
            service: ServiceState::Idle,
            completion_latency,
        }
    }

    /// This cache's id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether a request is currently in service.
    pub fn is_busy(&self) -> bool {
        !matches!(self.service, ServiceState::Idle)
    }

    /// MESI state this cache holds for the line containing `a`.
    ///
    /// Returns `Invalid` when the slot at `index(a)` does not currently hold
    /// the address's tag, regardless of what else occupies it.
    pub fn state_for(&self, a: u32) -> LineState {
        let line = &self.lines[addr::index(a)];
        if line.holds(a) {
            line.state
        } else {
            LineState::Invalid
        }
    }

    /// Read access to a raw slot, for the system-wide invariant checker.
    pub(crate) fn line_at(&self, index: usize) -> &CacheLine {
        &self.lines[index]
    }

    /// Offers a core's operation to the cache.
    ///
    /// Classifies the request against the indexed line and either starts the
    /// hit-completion countdown or issues the required bus transaction. When
    /// the bus refuses the transaction the acceptance is cancelled: the cache
    /// stays idle, nothing is counted, and the caller retries next cycle.
    ///
    /// # Arguments
    ///
    /// * `core_id` - The issuing core (stalled by the caller on `true`).
    /// * `op` - The operation to service.
    /// * `bus` - The shared bus, for miss and upgrade traffic.
    /// * `stats` - Counters updated on successful acceptance.
    ///
    /// # Returns
    ///
    /// `true` if the request is now in service; `false` if bus arbitration
    /// refused it this cycle.
    ///
    /// # Panics
    ///
    /// Panics if the cache is already servicing a request; the scheduler must
    /// not offer work to a busy cache.
    pub fn accept_request(
        &mut self,
        core_id: usize,
        op: MemOp,
        bus: &mut Bus,
        stats: &mut SimStats,
    ) -> bool {
        assert!(
            matches!(self.service, ServiceState::Idle),
            "cache {}: accept_request while busy",
            self.id
        );

        let idx = addr::index(op.addr);
        let hit = self.lines[idx].holds(op.addr);

        log::trace!(
            "cache {}: {:?} {:#x} idx={} {}",
            self.id,
            op.kind,
            op.addr,
            idx,
            if hit { "hit" } else { "miss" }
        );

        match (op.kind, hit) {
            (OpKind::Load, true) => {
                stats.hits += 1;
                self.service = ServiceState::Completing {
                    op,
                    core_id,
                    cycles_left: HIT_LATENCY,
                };
            }
            (OpKind::Load, false) => {
                let req = BusRequest {
                    cache_id: self.id,
                    kind: BusKind::BusRd,
                    addr: op.addr,
                };
                if !bus.request(req) {
                    return false;
                }
                stats.misses += 1;
                stats.bus_rd += 1;
                self.service = ServiceState::WaitingForBus { op, core_id };
            }
            (OpKind::Store, true) => match self.lines[idx].state {
                LineState::Modified => {
                    stats.hits += 1;
                    self.service = ServiceState::Completing {
                        op,
                        core_id,
                        cycles_left: HIT_LATENCY,
                    };
                }
                LineState::Exclusive => {
                    // Sole clean copy: upgrade locally, no bus traffic.
                    self.lines[idx].state = LineState::Modified;
                    stats.hits += 1;
                    self.service = ServiceState::Completing {
                        op,
                        core_id,
                        cycles_left: HIT_LATENCY,
                    };
                }
                LineState::Shared => {
                    let req = BusRequest {
                        cache_id: self.id,
                        kind: BusKind::BusUpgr,
                        addr: op.addr,
                    };
                    if !bus.request(req) {
                        return false;
                    }
                    stats.hits += 1;
                    stats.bus_upgr += 1;
                    self.service = ServiceState::WaitingForBus { op, core_id };
                }
                LineState::Invalid => unreachable!("hit classified on an invalid line"),
            },
            (OpKind::Store, false) => {
                let req = BusRequest {
                    cache_id: self.id,
                    kind: BusKind::BusRdX,
                    addr: op.addr,
                };
                if !bus.request(req) {
                    return false;
                }
                stats.misses += 1;
                stats.bus_rdx += 1;
                self.service = ServiceState::WaitingForBus { op, core_id };
            }
        }
        true
    }

    /// Advances the completion countdown by one cycle.
    ///
    /// When the countdown reaches zero, performs the data action (a load
    /// reads one byte at the line offset, a store writes its low byte there),
    /// releases the service slot, and returns the completion for the
    /// scheduler to dispatch.
    pub fn step(&mut self) -> Option<Completion> {
        let ServiceState::Completing {
            op,
            core_id,
            cycles_left,
        } = &mut self.service
        else {
            return None;
        };

        *cycles_left -= 1;
        if *cycles_left > 0 {
            return None;
        }
        let (op, core_id) = (*op, *core_id);

        let line = &mut self.lines[addr::index(op.addr)];
        let off = addr::offset(op.addr);
        let value = match op.kind {
            OpKind::Load => line.data[off] as u32,
            OpKind::Store => {
                line.data[off] = op.data as u8;
                op.data
            }
        };

        self.service = ServiceState::Idle;
        Some(Completion { core_id, value })
    }

    /// Observes a peer's bus transaction and updates the local copy.
    ///
    /// Returns the zero result when this cache is the requester or does not
    /// hold the line. Otherwise reports presence (and dirty data for an M
    /// copy), then applies the snoop transition: BusRd downgrades E/M to S,
    /// BusRdX and BusUpgr invalidate.
    pub fn snoop_and_update(&mut self, req: &BusRequest, stats: &mut SimStats) -> SnoopResult {
        let mut result = SnoopResult::default();
        if req.cache_id == self.id {
            return result;
        }

        let line = &mut self.lines[addr::index(req.addr)];
        if !line.holds(req.addr) {
            return result;
        }

        result.had_line = true;
        if line.state == LineState::Modified {
            result.was_dirty = true;
            result.data = Some(line.data);
        }

        let next = match req.kind {
            BusKind::BusRd => LineState::Shared,
            BusKind::BusRdX | BusKind::BusUpgr => LineState::Invalid,
        };
        if next == LineState::Invalid && line.state != LineState::Invalid {
            stats.invalidations += 1;
            log::debug!(
                "cache {}: {:#x} invalidated by {:?} from cache {}",
                self.id,
                req.addr,
                req.kind,
                req.cache_id
            );
        }
        line.state = next;

        result
    }

    /// Completes this cache's own bus transaction.
    ///
    /// Runs the victim protocol (a Modified victim is written back to its
    /// reconstructed line address, clean victims are dropped), installs the
    /// granted bytes for data-carrying transactions, applies the pending
    /// store byte for BusRdX/BusUpgr, and sets the final MESI state. The
    /// service slot moves to the completion countdown.
    ///
    /// # Errors
    ///
    /// `CoherenceError::UpgradeViolation` when a BusUpgr grant finds the line
    /// in any state other than Shared at the expected tag.
    ///
    /// # Panics
    ///
    /// Panics if the grant is not addressed to this cache or no bus request
    /// is pending here.
    pub fn on_bus_grant(
        &mut self,
        grant: &BusGrant,
        memory: &mut MainMemory,
    ) -> Result<(), CoherenceError> {
        assert_eq!(
            grant.req.cache_id, self.id,
            "grant delivered to the wrong cache"
        );
        let ServiceState::WaitingForBus { op, core_id } = self.service else {
            panic!("cache {}: grant without a pending bus request", self.id);
        };

        let idx = addr::index(grant.req.addr);
        let new_tag = addr::tag(grant.req.addr);
        let line = &mut self.lines[idx];

        // Conflict eviction: the slot holds a different line.
        if line.state != LineState::Invalid && line.tag != new_tag {
            if line.state == LineState::Modified {
                let victim = addr::victim_addr(line.tag, idx);
                log::debug!(
                    "cache {}: writeback of dirty victim {:#x} (idx {})",
                    self.id,
                    victim,
                    idx
                );
                memory.write_line(victim, &line.data);
            }
            line.state = LineState::Invalid;
        }

        match grant.req.kind {
            BusKind::BusRd => {
                line.data = grant.data;
                line.state = if grant.shared {
                    LineState::Shared
                } else {
                    LineState::Exclusive
                };
            }
            BusKind::BusRdX => {
                line.data = grant.data;
                line.data[addr::offset(op.addr)] = op.data as u8;
                line.state = LineState::Modified;
            }
            BusKind::BusUpgr => {
                // No data moves: the upgrade is only valid while our S copy
                // survives at this tag.
                if !(line.tag == new_tag && line.state == LineState::Shared) {
                    return Err(CoherenceError::UpgradeViolation {
                        cache_id: self.id,
                        addr: grant.req.addr,
                        state: line.state,
                    });
                }
                line.data[addr::offset(op.addr)] = op.data as u8;
                line.state = LineState::Modified;
            }
        }
        line.tag = new_tag;

        self.service = ServiceState::Completing {
            op,
            core_id,
            cycles_left: self.completion_latency,
        };
        Ok(())
    }
}
