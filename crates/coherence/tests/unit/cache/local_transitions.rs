//! Local MESI transition tests.
//!
//! Drives a single cache directly through its public API: requests are
//! accepted, the bus transaction (if any) is drained by hand, and a grant is
//! constructed the way the scheduler would. This exercises the transition
//! table without a full system.

use coherence::cache::Cache;
use coherence::cache::line::LineState;
use coherence::common::constants::LINE_SIZE;
use coherence::core::{MemOp, OpKind};
use coherence::soc::interconnect::{Bus, BusGrant, BusKind, BusRequest};
use coherence::soc::memory::MainMemory;
use coherence::stats::SimStats;

const LATENCY: u32 = 5;

fn load(addr: u32) -> MemOp {
    MemOp {
        kind: OpKind::Load,
        addr,
        data: 0,
    }
}

fn store(addr: u32, data: u32) -> MemOp {
    MemOp {
        kind: OpKind::Store,
        addr,
        data,
    }
}

/// Drains the pending bus transaction into a grant with the given flags.
fn grant(bus: &mut Bus, shared: bool) -> BusGrant {
    let req = bus.step().expect("a bus transaction should be pending");
    let mut g = BusGrant::new(req);
    g.shared = shared;
    g
}

/// Steps the cache until it reports completion, returning the value.
fn drain(cache: &mut Cache) -> u32 {
    for _ in 0..LATENCY {
        if let Some(done) = cache.step() {
            return done.value;
        }
    }
    panic!("request never completed");
}

/// Installs `addr` in the given state via a load or store miss.
fn install(cache: &mut Cache, bus: &mut Bus, mem: &mut MainMemory, addr: u32, state: LineState) {
    let mut stats = SimStats::default();
    let op = match state {
        LineState::Exclusive | LineState::Shared => load(addr),
        LineState::Modified => store(addr, 0),
        LineState::Invalid => return,
    };
    assert!(cache.accept_request(cache.id(), op, bus, &mut stats));
    let g = grant(bus, state == LineState::Shared);
    cache.on_bus_grant(&g, mem).unwrap();
    drain(cache);
    assert_eq!(cache.state_for(addr), state);
}

#[test]
fn load_miss_issues_bus_rd_and_installs_exclusive() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    let mut stats = SimStats::default();

    assert!(cache.accept_request(0, load(0x1000), &mut bus, &mut stats));
    assert!(cache.is_busy());
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.bus_rd, 1);

    let req = bus.step().unwrap();
    assert_eq!(req.kind, BusKind::BusRd);
    assert_eq!(req.addr, 0x1000);

    let mut g = BusGrant::new(req);
    g.shared = false;
    cache.on_bus_grant(&g, &mut mem).unwrap();
    assert_eq!(cache.state_for(0x1000), LineState::Exclusive);

    assert_eq!(drain(&mut cache), 0);
    assert!(!cache.is_busy());
}

#[test]
fn load_miss_with_sharer_installs_shared() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);

    install(&mut cache, &mut bus, &mut mem, 0x2000, LineState::Shared);
    assert_eq!(cache.state_for(0x2000), LineState::Shared);
}

#[test]
fn load_hit_completes_in_one_cycle_without_bus() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    install(&mut cache, &mut bus, &mut mem, 0x1000, LineState::Exclusive);

    let mut stats = SimStats::default();
    assert!(cache.accept_request(0, load(0x1000), &mut bus, &mut stats));
    assert!(!bus.is_busy(), "a hit must not touch the bus");
    assert_eq!(stats.hits, 1);

    assert!(cache.step().is_some(), "hit completes after one cycle");
}

#[test]
fn store_miss_issues_bus_rdx_and_applies_byte() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    let mut stats = SimStats::default();

    assert!(cache.accept_request(0, store(0x1004, 0xAB), &mut bus, &mut stats));
    assert_eq!(stats.bus_rdx, 1);

    let req = bus.step().unwrap();
    assert_eq!(req.kind, BusKind::BusRdX);
    cache.on_bus_grant(&BusGrant::new(req), &mut mem).unwrap();
    assert_eq!(cache.state_for(0x1004), LineState::Modified);
    drain(&mut cache);

    // The written byte is observable by a subsequent load of the same address.
    assert!(cache.accept_request(0, load(0x1004), &mut bus, &mut stats));
    assert_eq!(drain(&mut cache), 0xAB);
}

#[test]
fn store_hit_exclusive_upgrades_locally() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    install(&mut cache, &mut bus, &mut mem, 0x1000, LineState::Exclusive);

    let mut stats = SimStats::default();
    assert!(cache.accept_request(0, store(0x1000, 7), &mut bus, &mut stats));
    assert!(!bus.is_busy(), "E to M must be a silent transition");
    assert_eq!(cache.state_for(0x1000), LineState::Modified);
    drain(&mut cache);
    assert_eq!(stats.bus_rd + stats.bus_rdx + stats.bus_upgr, 0);
}

#[test]
fn store_hit_modified_completes_without_bus() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    install(&mut cache, &mut bus, &mut mem, 0x1000, LineState::Modified);

    let mut stats = SimStats::default();
    assert!(cache.accept_request(0, store(0x1000, 9), &mut bus, &mut stats));
    assert!(!bus.is_busy());
    assert!(cache.step().is_some());
    assert_eq!(cache.state_for(0x1000), LineState::Modified);
}

#[test]
fn store_hit_shared_issues_upgrade() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    install(&mut cache, &mut bus, &mut mem, 0x2000, LineState::Shared);

    let mut stats = SimStats::default();
    assert!(cache.accept_request(0, store(0x2000, 7), &mut bus, &mut stats));
    assert_eq!(stats.bus_upgr, 1);

    let req = bus.step().unwrap();
    assert_eq!(req.kind, BusKind::BusUpgr);
    cache.on_bus_grant(&BusGrant::new(req), &mut mem).unwrap();
    assert_eq!(cache.state_for(0x2000), LineState::Modified);
    assert_eq!(drain(&mut cache), 7);
}

#[test]
fn upgrade_grant_after_invalidation_is_a_violation() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    install(&mut cache, &mut bus, &mut mem, 0x2000, LineState::Shared);

    let mut stats = SimStats::default();
    assert!(cache.accept_request(0, store(0x2000, 7), &mut bus, &mut stats));
    let req = bus.step().unwrap();

    // A peer's BusRdX lands between request and grant and steals the line.
    let peer = BusRequest {
        cache_id: 1,
        kind: BusKind::BusRdX,
        addr: 0x2000,
    };
    cache.snoop_and_update(&peer, &mut stats);
    assert_eq!(cache.state_for(0x2000), LineState::Invalid);

    let err = cache.on_bus_grant(&BusGrant::new(req), &mut mem).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("0x2000"), "diagnostic names the address: {}", msg);
}

#[test]
fn bus_refusal_cancels_acceptance() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut stats = SimStats::default();

    // Occupy the bus with another cache's transaction.
    assert!(bus.request(BusRequest {
        cache_id: 1,
        kind: BusKind::BusRd,
        addr: 0x5000,
    }));

    assert!(!cache.accept_request(0, load(0x1000), &mut bus, &mut stats));
    assert!(!cache.is_busy(), "refused cache must stay idle");
    assert_eq!(stats.misses, 0, "a refused attempt is not counted");
}

#[test]
#[should_panic(expected = "while busy")]
fn accept_while_busy_panics() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut stats = SimStats::default();

    assert!(cache.accept_request(0, load(0x1000), &mut bus, &mut stats));
    cache.accept_request(0, load(0x2000), &mut bus, &mut stats);
}

#[test]
#[should_panic(expected = "wrong cache")]
fn grant_for_another_cache_panics() {
    let mut cache = Cache::new(0, LATENCY);
    let mut mem = MainMemory::new(1 << 20);
    let g = BusGrant::new(BusRequest {
        cache_id: 1,
        kind: BusKind::BusRd,
        addr: 0x1000,
    });
    let _ = cache.on_bus_grant(&g, &mut mem);
}

#[test]
fn granted_data_is_installed() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);
    let mut stats = SimStats::default();

    // Seed memory so the grant carries a recognizable line.
    let mut line = [0u8; LINE_SIZE];
    line[4] = 0x5C;
    mem.write_line(0x1000, &line);

    assert!(cache.accept_request(0, load(0x1004), &mut bus, &mut stats));
    let req = bus.step().unwrap();
    let mut g = BusGrant::new(req);
    mem.read_line(req.addr, &mut g.data);
    cache.on_bus_grant(&g, &mut mem).unwrap();

    assert_eq!(drain(&mut cache), 0x5C);
}
