//! Incremental mark-compact garbage collector (§4.15): a single contiguous
//! heap with a handle area in front, compacted by updating one word
//! (offset 0) per moved handle rather than chasing pointers.
//!
//! Root discovery (the conservative stack scan) is the caller's job —
//! only `smp::cluster` holds every core's stack-cache contents — so
//! `begin_cycle` takes the already-identified roots rather than walking
//! stacks itself.

pub mod barrier;

use crate::memory::MainMemory;
use crate::runtime::class::MethodTable;
use crate::runtime::exception::ExceptionKind;
use crate::runtime::handle::{HandleTable, HandleType, LIST_END};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Mark,
    Compact,
    Sweep,
}

pub struct Collector {
    phase: Phase,
    current_mark: u32,
    gray_head: u32,
    alloc_ptr: u32,
    compact_frontier: u32,
    heap_base: u32,
    heap_words: u32,
    mark_step: usize,
    compact_step: usize,
    trigger_free_fraction: f32,
    sizes: std::collections::HashMap<u32, u32>,
}

impl Collector {
    pub fn new(heap_words: u32, mark_step: usize, compact_step: usize, trigger_free_fraction: f32) -> Self {
        Self {
            phase: Phase::Idle,
            current_mark: 1,
            gray_head: LIST_END,
            alloc_ptr: heap_words,
            compact_frontier: 0,
            heap_base: 0,
            heap_words,
            mark_step,
            compact_step,
            trigger_free_fraction,
            sizes: std::collections::HashMap::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn free_words(&self) -> u32 {
        self.alloc_ptr.saturating_sub(self.compact_frontier)
    }

    /// §4.15 "Trigger": proactive when free drops under the configured
    /// fraction of heap, regardless of whether allocation has failed yet.
    pub fn should_collect(&self) -> bool {
        self.phase == Phase::Idle
            && (self.free_words() as f32 / self.heap_words.max(1) as f32) < self.trigger_free_fraction
    }

    /// Bump-pointer allocation from the top of heap downward. Zero-inits
    /// the reserved region (Java default-init semantics) and pops a
    /// handle from the free list. Returns `OutOfMemory` if either the
    /// heap or the handle table is exhausted; the caller is expected to
    /// have already run a collection via `should_collect`/`begin_cycle`
    /// when this is reached deliberately rather than by surprise.
    pub fn allocate(
        &mut self,
        heap: &mut MainMemory,
        handles: &mut HandleTable,
        size_words: u32,
        ty: HandleType,
        method_table_or_len: u32,
    ) -> Result<u32, ExceptionKind> {
        if self.alloc_ptr < self.compact_frontier + size_words {
            return Err(ExceptionKind::OutOfMemory);
        }
        self.alloc_ptr -= size_words;
        let data_ptr = self.alloc_ptr;
        heap.zero_range(data_ptr, size_words);
        let handle = handles
            .alloc(data_ptr, method_table_or_len, ty, self.current_mark)
            .ok_or(ExceptionKind::OutOfMemory)?;
        self.sizes.insert(handle, size_words);
        Ok(handle)
    }

    /// ROOT_SCAN (§4.15): flips `current_mark` so every existing live
    /// handle now carries the *old* mark, then seeds the gray list from
    /// the caller-supplied roots (conservative stack words plus the
    /// static reference vector). Modelled as instantaneous, matching the
    /// STW phase's "assert GC-halt ... deassert GC-halt" bracket — the
    /// halt itself is the cluster's responsibility around this call.
    pub fn begin_cycle(&mut self, handles: &mut HandleTable, roots: &[u32]) {
        self.current_mark = if self.current_mark == 1 { 2 } else { 1 };
        self.gray_head = LIST_END;
        self.phase = Phase::Mark;
        for &root in roots {
            self.push_gray(handles, root);
        }
    }

    fn push_gray(&mut self, handles: &mut HandleTable, handle: u32) {
        if handle == 0 || handles.is_free(handle) {
            return;
        }
        if handles.mark(handle) == self.current_mark {
            return;
        }
        if handles.gray_link(handle) != 0 {
            return;
        }
        let link = if self.gray_head == LIST_END {
            LIST_END
        } else {
            self.gray_head
        };
        handles.set_gray_link(handle, link);
        self.gray_head = handle;
    }

    /// §4.17 write barrier entry point: called when a reference-typed
    /// field/array-element/static slot is about to be overwritten. Grays
    /// the *old* value if it is a live, not-yet-marked handle, so a
    /// concurrent mutator cannot hide a reachable object from the
    /// snapshot-at-beginning collector.
    pub fn write_barrier(&mut self, handles: &mut HandleTable, old_value: u32) {
        self.push_gray(handles, old_value);
    }

    /// Advance one increment of whichever phase is active. Returns the
    /// phase reached after the step so the caller can decide whether to
    /// release GC-halt (the collector itself only holds STW during
    /// `begin_cycle`, never during `tick`).
    pub fn tick(
        &mut self,
        heap: &mut MainMemory,
        handles: &mut HandleTable,
        methods: &MethodTable,
        size_of: impl Fn(u32) -> u32,
    ) -> Phase {
        match self.phase {
            Phase::Idle => {}
            Phase::Mark => self.mark_step(heap, handles, methods),
            Phase::Compact => self.compact_step(heap, handles, size_of),
            Phase::Sweep => {
                handles.sweep(self.current_mark);
                self.phase = Phase::Idle;
            }
        }
        self.phase
    }

    /// Push children of one popped gray handle (§4.15 MARK "push
    /// children"): for an object, every reference-typed field named by
    /// the class's gc-info bitmask; for a reference array, every element.
    /// Primitive arrays have no reference children.
    fn gray_children(&mut self, heap: &MainMemory, handles: &mut HandleTable, methods: &MethodTable, handle: u32) {
        let data_ptr = handles.data_pointer(handle);
        match handles.handle_type(handle) {
            HandleType::Object => {
                for field in methods.reference_fields(handles.method_table_pointer(handle)) {
                    let child = heap.read(data_ptr + field);
                    self.push_gray(handles, child);
                }
            }
            HandleType::ReferenceArray => {
                let length = handles.array_length(handle);
                for index in 0..length {
                    let child = heap.read(data_ptr + index);
                    self.push_gray(handles, child);
                }
            }
            HandleType::PrimitiveArray => {}
        }
    }

    fn mark_step(&mut self, heap: &MainMemory, handles: &mut HandleTable, methods: &MethodTable) {
        for _ in 0..self.mark_step {
            if self.gray_head == LIST_END {
                handles.sort_use_list_by_data_pointer();
                self.compact_frontier = self.heap_base;
                self.phase = Phase::Compact;
                return;
            }
            let handle = self.gray_head;
            self.gray_head = handles.gray_link(handle);
            handles.set_gray_link(handle, 0);
            handles.set_mark(handle, self.current_mark);
            self.gray_children(heap, handles, methods, handle);
        }
    }

    fn compact_step(&mut self, heap: &mut MainMemory, handles: &mut HandleTable, size_of: impl Fn(u32) -> u32) {
        let mut cur = handles.use_list_head();
        let mut processed = 0;
        while cur != LIST_END && processed < self.compact_step {
            let size = *self.sizes.entry(cur).or_insert_with(|| size_of(cur));
            let old_ptr = handles.data_pointer(cur);
            if old_ptr != self.compact_frontier {
                let words = heap.read_block(old_ptr, size);
                heap.write_block(self.compact_frontier, &words);
                handles.set_data_pointer(cur, self.compact_frontier);
            }
            self.compact_frontier += size;
            cur = handles.next_link(cur);
            processed += 1;
        }
        if cur == LIST_END {
            let dead_region = self.alloc_ptr.saturating_sub(self.compact_frontier);
            heap.zero_range(self.compact_frontier, dead_region);
            self.alloc_ptr = self.compact_frontier;
            self.phase = Phase::Sweep;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemTiming;

    #[test]
    fn allocate_zero_inits_and_pops_handle() {
        let mut heap = MainMemory::new(256, MemTiming::Bram);
        let mut handles = HandleTable::new(16);
        let mut gc = Collector::new(256, 8, 4, 0.25);
        heap.write(250, 0xFFFF_FFFF);
        let h = gc
            .allocate(&mut heap, &mut handles, 4, HandleType::Object, 0)
            .unwrap();
        assert!(handles.data_pointer(h) <= 252);
        assert_eq!(heap.read(handles.data_pointer(h) + 2), 0);
    }

    #[test]
    fn allocation_failure_reports_out_of_memory() {
        let mut heap = MainMemory::new(4, MemTiming::Bram);
        let mut handles = HandleTable::new(16);
        let mut gc = Collector::new(4, 8, 4, 0.25);
        assert!(gc.allocate(&mut heap, &mut handles, 4, HandleType::Object, 0).is_ok());
        assert_eq!(
            gc.allocate(&mut heap, &mut handles, 4, HandleType::Object, 0),
            Err(ExceptionKind::OutOfMemory)
        );
    }

    #[test]
    fn full_cycle_compacts_survivor_to_heap_base_and_frees_garbage() {
        let mut heap = MainMemory::new(64, MemTiming::Bram);
        let mut handles = HandleTable::new(8);
        let mut gc = Collector::new(64, 8, 8, 0.25);
        let h1 = gc.allocate(&mut heap, &mut handles, 4, HandleType::Object, 0).unwrap();
        let h2 = gc.allocate(&mut heap, &mut handles, 4, HandleType::Object, 0).unwrap();

        gc.begin_cycle(&mut handles, &[h1]);
        let methods = MethodTable::new();
        while gc.phase() != Phase::Idle {
            gc.tick(&mut heap, &mut handles, &methods, |_| 4);
        }

        assert!(!handles.is_free(h1));
        assert!(handles.is_free(h2));
        assert_eq!(handles.data_pointer(h1), 0);
    }

    #[test]
    fn write_barrier_preserves_liveness_of_overwritten_reference() {
        let mut heap = MainMemory::new(64, MemTiming::Bram);
        let mut handles = HandleTable::new(8);
        let mut gc = Collector::new(64, 8, 8, 0.25);
        let h1 = gc.allocate(&mut heap, &mut handles, 4, HandleType::Object, 0).unwrap();

        gc.begin_cycle(&mut handles, &[]); // h1 not a root this cycle
        gc.write_barrier(&mut handles, h1); // but a mutator overwrote a slot holding it
        let methods = MethodTable::new();
        while gc.phase() != Phase::Idle {
            gc.tick(&mut heap, &mut handles, &methods, |_| 4);
        }
        assert!(!handles.is_free(h1));
    }
}
