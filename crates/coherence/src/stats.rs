//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters the simulator accumulates per run. It provides:
//! 1. **Cycle and retirement:** Total cycles and completed memory operations.
//! 2. **Cache behavior:** Hit/miss counts across all caches.
//! 3. **Bus traffic:** Per-kind transaction counts (BusRd, BusRdX, BusUpgr).
//! 4. **Coherence activity:** Snoop-induced invalidations.
//! 5. **Stalls:** Cycles cores spent waiting on their cache.

use std::time::Instant;

/// Cumulative counters for one simulated system.
///
/// All counters are aggregated across every core and cache; per-cache
/// breakdowns are not tracked. Counters only ever increase.
#[derive(Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Total simulated cycles elapsed.
    pub cycles: u64,
    /// Memory operations completed (loads and stores).
    pub instructions_retired: u64,

    /// Requests serviced from a line already held by the cache.
    pub hits: u64,
    /// Requests that required a bus transaction to fetch or own the line.
    pub misses: u64,

    /// BusRd transactions issued (read misses).
    pub bus_rd: u64,
    /// BusRdX transactions issued (write misses, read-for-ownership).
    pub bus_rdx: u64,
    /// BusUpgr transactions issued (S-to-M upgrades, no data transfer).
    pub bus_upgr: u64,

    /// Peer lines invalidated by snooped traffic.
    pub invalidations: u64,
    /// Core-cycles spent stalled waiting for a cache to complete.
    pub stall_cycles: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            hits: 0,
            misses: 0,
            bus_rd: 0,
            bus_rdx: 0,
            bus_upgr: 0,
            invalidations: 0,
            stall_cycles: 0,
        }
    }
}

impl SimStats {
    /// Total bus transactions of any kind.
    pub fn bus_transactions(&self) -> u64 {
        self.bus_rd + self.bus_rdx + self.bus_upgr
    }

    /// Fraction of accesses serviced without a bus transaction, in `[0, 1]`.
    ///
    /// Returns 0.0 when no accesses have been recorded.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = if self.cycles == 0 { 1 } else { self.cycles };

        println!("\n==========================================================");
        println!("MESI COHERENCE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_ops                  {}", self.instructions_retired);
        println!(
            "sim_opc                  {:.4}",
            self.instructions_retired as f64 / cyc as f64
        );
        println!("----------------------------------------------------------");
        println!("CACHES");
        println!("  hits                   {}", self.hits);
        println!("  misses                 {}", self.misses);
        println!("  hit_rate               {:.2}%", self.hit_rate() * 100.0);
        println!("----------------------------------------------------------");
        println!("BUS");
        println!("  bus_rd                 {}", self.bus_rd);
        println!("  bus_rdx                {}", self.bus_rdx);
        println!("  bus_upgr               {}", self.bus_upgr);
        println!("  total                  {}", self.bus_transactions());
        println!("----------------------------------------------------------");
        println!("COHERENCE");
        println!("  invalidations          {}", self.invalidations);
        println!(
            "  stall_cycles           {} ({:.2}%)",
            self.stall_cycles,
            (self.stall_cycles as f64 / cyc as f64) * 100.0
        );
        println!("==========================================================");
    }
}
