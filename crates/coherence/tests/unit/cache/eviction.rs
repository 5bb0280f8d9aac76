//! Victim eviction tests.
//!
//! Two addresses with the same index and different tags conflict in one
//! direct-mapped slot. Installing the second must write a Modified victim
//! back to memory at its reconstructed line address, and silently drop a
//! clean one.

use coherence::cache::Cache;
use coherence::cache::line::LineState;
use coherence::common::constants::{LINE_SIZE, NUM_LINES};
use coherence::core::{MemOp, OpKind};
use coherence::soc::interconnect::{Bus, BusGrant};
use coherence::soc::memory::MainMemory;
use coherence::stats::SimStats;

const LATENCY: u32 = 5;
const A: u32 = 0x3000;
const B: u32 = A + (LINE_SIZE * NUM_LINES) as u32; // same index, next tag

fn issue(cache: &mut Cache, bus: &mut Bus, mem: &mut MainMemory, op: MemOp) {
    let mut stats = SimStats::default();
    assert!(cache.accept_request(0, op, bus, &mut stats));
    if let Some(req) = bus.step() {
        let mut g = BusGrant::new(req);
        mem.read_line(req.addr, &mut g.data);
        cache.on_bus_grant(&g, mem).unwrap();
    }
    for _ in 0..LATENCY {
        if cache.step().is_some() {
            break;
        }
    }
}

#[test]
fn dirty_victim_is_written_back() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);

    issue(
        &mut cache,
        &mut bus,
        &mut mem,
        MemOp {
            kind: OpKind::Store,
            addr: A,
            data: 99,
        },
    );
    assert_eq!(cache.state_for(A), LineState::Modified);
    assert_eq!(mem.read_byte(A), 0, "dirty data not yet in memory");

    issue(
        &mut cache,
        &mut bus,
        &mut mem,
        MemOp {
            kind: OpKind::Store,
            addr: B,
            data: 11,
        },
    );

    assert_eq!(cache.state_for(A), LineState::Invalid);
    assert_eq!(cache.state_for(B), LineState::Modified);
    assert_eq!(mem.read_byte(A), 99, "victim writeback lands at the victim's address");
}

#[test]
fn clean_victim_is_dropped_silently() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);

    issue(
        &mut cache,
        &mut bus,
        &mut mem,
        MemOp {
            kind: OpKind::Load,
            addr: A,
            data: 0,
        },
    );
    assert_eq!(cache.state_for(A), LineState::Exclusive);

    // Sentinel written straight to memory after the clean copy was taken: an
    // erroneous writeback of the (all-zero) cached copy would clobber it.
    let mut sentinel = [0u8; LINE_SIZE];
    sentinel[0] = 7;
    mem.write_line(A, &sentinel);

    issue(
        &mut cache,
        &mut bus,
        &mut mem,
        MemOp {
            kind: OpKind::Load,
            addr: B,
            data: 0,
        },
    );

    assert_eq!(cache.state_for(A), LineState::Invalid);
    assert_eq!(cache.state_for(B), LineState::Exclusive);
    assert_eq!(mem.read_byte(A), 7, "clean eviction must not touch memory");
}

#[test]
fn install_at_same_tag_does_not_evict() {
    let mut cache = Cache::new(0, LATENCY);
    let mut bus = Bus::new();
    let mut mem = MainMemory::new(1 << 20);

    issue(
        &mut cache,
        &mut bus,
        &mut mem,
        MemOp {
            kind: OpKind::Store,
            addr: A,
            data: 42,
        },
    );
    // A store to another offset of the same line hits; no bus, no eviction.
    let mut stats = SimStats::default();
    assert!(cache.accept_request(
        0,
        MemOp {
            kind: OpKind::Store,
            addr: A + 8,
            data: 43,
        },
        &mut bus,
        &mut stats,
    ));
    assert!(!bus.is_busy());
    assert_eq!(stats.hits, 1);
    assert_eq!(cache.state_for(A), LineState::Modified);
}
