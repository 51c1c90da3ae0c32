//! Bus mastership primitive (§4.9): source tagging for round-robin
//! arbitration between cores and the stack-cache spill/fill DMA path,
//! following the teacher's `Bus`/`BusMaster` split
//! (`core/src/core/bus.rs`). Actual data movement goes directly through
//! `MainMemory`/cache calls; `BusMaster` exists so the arbiter can decide
//! whose turn it is without the controllers going through a shared
//! command/response queue.

pub mod arbiter;

/// Identifies who issued a bus command: a core, or the stack-cache spill/
/// fill DMA path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusMaster {
    Core(usize),
    StackSpill(usize),
}

impl BusMaster {
    pub fn core_id(self) -> Option<usize> {
        match self {
            BusMaster::Core(id) | BusMaster::StackSpill(id) => Some(id),
        }
    }
}
