//! Shared-bus multiprocessor system.
//!
//! This module assembles cores, caches, bus, and memory into one simulated
//! machine and drives them on a fixed per-cycle schedule. It provides:
//! 1. **Ownership:** The `System` exclusively owns every component; all
//!    cross-references are integer ids, never pointers.
//! 2. **Scheduling:** A five-phase step function (core advance, arbitration,
//!    bus + snoop broadcast, cache advance, bookkeeping) that totally orders
//!    every state transition within a cycle.
//! 3. **Invariant checking:** The global MESI exclusivity rules are asserted
//!    on the peer-projected state of every bus transaction.

/// Shared snooping bus and transaction types.
pub mod interconnect;
/// Flat line-granular main memory.
pub mod memory;

use crate::cache::line::LineState;
use crate::cache::{Cache, SnoopResult};
use crate::common::addr;
use crate::common::constants::NUM_LINES;
use crate::common::error::CoherenceError;
use crate::config::Config;
use crate::core::Core;
use crate::stats::SimStats;
use self::interconnect::{Bus, BusGrant};
use self::memory::MainMemory;

/// A complete simulated multiprocessor: N cores with private caches on one
/// atomic bus over flat main memory.
pub struct System {
    config: Config,
    cycle: u64,
    rr_next: usize,
    cores: Vec<Core>,
    caches: Vec<Cache>,
    bus: Bus,
    memory: MainMemory,
    stats: SimStats,
}

impl System {
    /// Creates a system with `num_cores` cores and default configuration.
    pub fn new(num_cores: usize) -> Self {
        let mut config = Config::default();
        config.system.num_cores = num_cores;
        Self::with_config(config)
    }

    /// Creates a system from a full configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration names zero cores or a zero completion
    /// latency (the countdown must run for at least one cycle).
    pub fn with_config(config: Config) -> Self {
        let n = config.system.num_cores;
        assert!(n > 0, "a system needs at least one core");
        assert!(
            config.system.completion_latency > 0,
            "completion latency must be at least one cycle"
        );

        let cores = (0..n).map(Core::new).collect();
        let caches = (0..n)
            .map(|id| Cache::new(id, config.system.completion_latency))
            .collect();
        let memory = MainMemory::new(config.memory.size_bytes);

        Self {
            config,
            cycle: 0,
            rr_next: 0,
            cores,
            caches,
            bus: Bus::new(),
            memory,
            stats: SimStats::default(),
        }
    }

    /// Number of cores (and caches) in the system.
    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }

    /// Current cycle count.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Accumulated statistics.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Core `id`, for trace installation and assertions.
    pub fn get_core(&self, id: usize) -> &Core {
        &self.cores[id]
    }

    /// Mutable core `id`.
    pub fn get_core_mut(&mut self, id: usize) -> &mut Core {
        &mut self.cores[id]
    }

    /// Cache `id`, for state inspection.
    pub fn get_cache(&self, id: usize) -> &Cache {
        &self.caches[id]
    }

    /// The shared bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Whether the whole system is quiescent: every trace exhausted, no core
    /// stalled, no cache in service, bus idle.
    pub fn is_done(&self) -> bool {
        self.cores
            .iter()
            .all(|c| c.is_finished() && !c.is_stalled())
            && self.caches.iter().all(|c| !c.is_busy())
            && !self.bus.is_busy()
    }

    /// Advances the system by exactly one cycle.
    ///
    /// The five phases run in a fixed order; arbitration observes the state
    /// left by the previous cycle's completions, the snoop broadcast and
    /// grant delivery resolve atomically, and completion timers tick only
    /// after the grant has installed.
    ///
    /// # Errors
    ///
    /// Propagates any MESI invariant violation; the system must not be
    /// stepped again afterwards.
    pub fn step(&mut self) -> Result<(), CoherenceError> {
        // Phase 1: core advance (trace players hold no per-cycle state).
        for core in &mut self.cores {
            core.step();
        }

        // Phase 2: round-robin arbitration, at most one acceptance per cycle.
        let n = self.cores.len();
        self.stats.stall_cycles += self.cores.iter().filter(|c| c.is_stalled()).count() as u64;
        for i in 0..n {
            let id = (self.rr_next + i) % n;
            if self.cores[id].is_stalled() || !self.cores[id].has_request() {
                continue;
            }
            if self.caches[id].is_busy() {
                continue;
            }
            let op = self.cores[id].current_op();
            if self.caches[id].accept_request(id, op, &mut self.bus, &mut self.stats) {
                self.cores[id].stall();
                self.rr_next = (id + 1) % n;
                break;
            }
            // Bus refused: the core retries on a later cycle; keep scanning
            // so a hit-serviceable core is not blocked behind a busy bus.
        }

        // Phase 3: bus step, snoop broadcast, invariant check, grant delivery.
        if let Some(req) = self.bus.step() {
            let mut grant = BusGrant::new(req);
            let mut dirty: Option<SnoopResult> = None;

            for cache in &mut self.caches {
                let res = cache.snoop_and_update(&req, &mut self.stats);
                grant.shared |= res.had_line;
                grant.flush |= res.was_dirty;
                if res.was_dirty {
                    dirty = Some(res);
                }
            }

            if let Some(res) = dirty {
                // A dirty peer supplies the line and memory is rewritten so
                // the backing copy stays coherent.
                let data = res.data.expect("dirty snoop result carries data");
                grant.data = data;
                self.memory.write_line(req.addr, &data);
            } else {
                self.memory.read_line(req.addr, &mut grant.data);
            }

            if self.config.general.trace_protocol {
                log::trace!(
                    "cycle {}: {:?} {:#x} -> cache {} (shared={} flush={})",
                    self.cycle,
                    req.kind,
                    req.addr,
                    req.cache_id,
                    grant.shared,
                    grant.flush
                );
            }

            self.check_coherence()?;
            self.caches[req.cache_id].on_bus_grant(&grant, &mut self.memory)?;
        }

        // Phase 4: cache advance; completions dispatch back to their cores.
        for cache in &mut self.caches {
            if let Some(done) = cache.step() {
                self.cores[done.core_id].notify_complete(done.value);
                self.stats.instructions_retired += 1;
            }
        }

        // Phase 5: bookkeeping.
        self.cycle += 1;
        self.stats.cycles += 1;
        Ok(())
    }

    /// Runs until `max_cycles` elapse or the system is quiescent.
    ///
    /// # Errors
    ///
    /// Propagates the first MESI invariant violation encountered.
    pub fn run(&mut self, max_cycles: u64) -> Result<(), CoherenceError> {
        for _ in 0..max_cycles {
            if self.is_done() {
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    /// Verifies the global MESI exclusivity invariants for every line held
    /// anywhere in the system.
    ///
    /// Runs after the snoop pass and before grant delivery, so it sees the
    /// peer-projected state of the in-flight transaction.
    fn check_coherence(&self) -> Result<(), CoherenceError> {
        let n = self.caches.len();
        for idx in 0..NUM_LINES {
            for first in 0..n {
                let line = self.caches[first].line_at(idx);
                if line.state == LineState::Invalid {
                    continue;
                }
                // Evaluate each (index, tag) pair once, at its first holder.
                let already_seen = (0..first)
                    .any(|c| self.caches[c].line_at(idx).holds_tag(line.tag));
                if already_seen {
                    continue;
                }

                let line_addr = addr::victim_addr(line.tag, idx);
                let states: Vec<LineState> =
                    (0..n).map(|c| self.caches[c].state_for(line_addr)).collect();

                let modified = states.iter().filter(|s| **s == LineState::Modified).count();
                let exclusive = states
                    .iter()
                    .filter(|s| **s == LineState::Exclusive)
                    .count();
                let holders = states.iter().filter(|s| **s != LineState::Invalid).count();

                if modified > 1 || exclusive > 1 {
                    return Err(CoherenceError::MultipleOwners {
                        addr: line_addr,
                        states,
                    });
                }
                if (modified == 1 || exclusive == 1) && holders > 1 {
                    let owner = states
                        .iter()
                        .position(|s| matches!(s, LineState::Modified | LineState::Exclusive))
                        .expect("an owning state exists");
                    return Err(CoherenceError::OwnerNotExclusive {
                        addr: line_addr,
                        owner,
                        states,
                    });
                }
            }
        }
        Ok(())
    }
}
