//! Simulator configuration: geometry and policy knobs for the pipeline,
//! caches, heap, and SMP lock fabric. Plain data, analogous to the
//! per-machine constructor parameters used by the teacher's arcade systems.

use crate::memory::MemTiming;

/// Which global synchronization primitive backs `monitorenter`/`monitorexit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockFabric {
    /// Single global compare-and-sync lock shared by all cores (§4.11).
    CmpSync,
    /// Per-object hardware lock unit with a fixed number of slots (§4.12).
    Ihlu { slots: usize },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Number of cores in the cluster.
    pub num_cores: usize,
    /// Number of banks in the stack cache sliding window (>= 3).
    pub stack_cache_banks: usize,
    /// Words per stack cache bank.
    pub stack_cache_bank_words: usize,
    /// Main memory size in 32-bit words.
    pub heap_words: usize,
    /// Maximum live handles, independent of heap size (§4.15 "Handle cap").
    pub handle_capacity: usize,
    /// Number of method cache blocks (fixed at 16 per §4.6).
    pub method_cache_blocks: usize,
    /// Bytecode bytes covered by one method cache block.
    pub method_cache_block_bytes: usize,
    /// Number of entries in each core's object field cache (§4.7).
    pub object_cache_entries: usize,
    /// Number of cache lines in each core's array element cache (§4.8).
    pub array_cache_entries: usize,
    /// Main memory timing model.
    pub mem_timing: MemTiming,
    /// SMP lock fabric selection.
    pub lock_fabric: LockFabric,
    /// Gray handles processed per incremental MARK step (§4.15).
    pub mark_step: usize,
    /// Handles compacted per incremental COMPACT step (§4.15).
    pub compact_step: usize,
    /// Proactive GC trigger threshold: collect when free heap fraction
    /// drops below this value (e.g. 0.25 for "< 25% free").
    pub gc_trigger_free_fraction: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_cores: 1,
            stack_cache_banks: 4,
            stack_cache_bank_words: 16,
            heap_words: 1 << 16,
            handle_capacity: 65_536,
            method_cache_blocks: 16,
            method_cache_block_bytes: 64,
            object_cache_entries: 16,
            array_cache_entries: 16,
            mem_timing: MemTiming::Bram,
            lock_fabric: LockFabric::CmpSync,
            mark_step: 8,
            compact_step: 4,
            gc_trigger_free_fraction: 0.25,
        }
    }
}
