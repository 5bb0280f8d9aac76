//! Trace-player core.
//!
//! A core issues a fixed trace of memory operations in order. It has no
//! internal pipeline: it presents its current operation to the scheduler,
//! stalls when its cache accepts the request, and advances when the cache
//! reports completion. The last completed load is retained so test harnesses
//! can assert on observed values.

/// The kind of a memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    /// Read one byte.
    Load,
    /// Write one byte.
    Store,
}

/// One memory operation in a core's trace.
///
/// `data` is meaningful only for stores; the low byte is written at the
/// address's line offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemOp {
    /// Load or store.
    pub kind: OpKind,
    /// Byte address the operation targets.
    pub addr: u32,
    /// Store payload (low byte is written); ignored for loads.
    pub data: u32,
}

/// A single processing core replaying a deterministic trace.
pub struct Core {
    id: usize,
    trace: Vec<MemOp>,
    pc: usize,
    stalled: bool,

    /// Address of the most recently completed load.
    pub last_load_addr: u32,
    /// Value returned by the most recently completed load.
    pub last_load_value: u32,
    /// Whether any load has completed since the trace was installed.
    pub has_load_value: bool,
}

impl Core {
    /// Creates a core with an empty trace.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            trace: Vec::new(),
            pc: 0,
            stalled: false,
            last_load_addr: 0,
            last_load_value: 0,
            has_load_value: false,
        }
    }

    /// This core's id (equal to the id of its private cache).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Advances the core by one cycle.
    ///
    /// Trace players hold no internal state between operations, so this is a
    /// placeholder kept for schedule symmetry with the other components.
    pub fn step(&mut self) {}

    /// Whether the core has an operation ready to issue.
    pub fn has_request(&self) -> bool {
        !self.stalled && self.pc < self.trace.len()
    }

    /// The operation at the current trace position.
    ///
    /// # Panics
    ///
    /// Panics if the trace is exhausted; callers must check `has_request`.
    pub fn current_op(&self) -> MemOp {
        self.trace[self.pc]
    }

    /// Marks the core as waiting for its cache.
    pub fn stall(&mut self) {
        self.stalled = true;
    }

    /// Whether the core is waiting on an outstanding request.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Whether the trace has been fully issued.
    pub fn is_finished(&self) -> bool {
        self.pc >= self.trace.len()
    }

    /// Completion callback from the cache: records the load value, advances
    /// the trace position, and clears the stall.
    pub fn notify_complete(&mut self, value: u32) {
        if let Some(op) = self.trace.get(self.pc) {
            if op.kind == OpKind::Load {
                self.last_load_addr = op.addr;
                self.last_load_value = value;
                self.has_load_value = true;
            }
            log::trace!(
                "core {}: {:?} {:#x} complete (value {})",
                self.id,
                op.kind,
                op.addr,
                value
            );
        }
        self.pc += 1;
        self.stalled = false;
    }

    /// Removes all trace entries and resets the replay position.
    pub fn clear_trace(&mut self) {
        self.trace.clear();
        self.pc = 0;
        self.stalled = false;
        self.has_load_value = false;
    }

    /// Appends an operation to the trace.
    pub fn add_op(&mut self, kind: OpKind, addr: u32, data: u32) {
        self.trace.push(MemOp { kind, addr, data });
    }

    /// Appends a load of `addr` to the trace.
    pub fn add_load(&mut self, addr: u32) {
        self.add_op(OpKind::Load, addr, 0);
    }

    /// Appends a store of `data` to `addr` to the trace.
    pub fn add_store(&mut self, addr: u32, data: u32) {
        self.add_op(OpKind::Store, addr, data);
    }
}
