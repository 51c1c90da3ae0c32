//! The `N`-core cluster (§2, §4.9-§4.17): shared main memory and heap, one
//! handle table and method table, one lock fabric, one collector, and a
//! `Core` per hardware thread. Owns the conservative stack scan the
//! collector needs for `begin_cycle`'s roots, since only the cluster can
//! see every core's stack-cache contents at once.

use crate::bus::arbiter::BusArbiter;
use crate::config::{Config, LockFabric as LockFabricChoice};
use crate::core::Core;
use crate::gc::Collector;
use crate::memory::MainMemory;
use crate::pipeline::microcode::MicrocodeRom;
use crate::runtime::handle::HandleTable;

use super::cmp_sync::CmpSync;
use super::ihlu::Ihlu;
use super::snoop::{broadcast, SnoopEvent};
use super::Fabric;

pub struct Cluster {
    cores: Vec<Core>,
    mem: MainMemory,
    heap: MainMemory,
    handles: HandleTable,
    rom: MicrocodeRom,
    jump_table: crate::bytecode::jump_table::JumpTable,
    fabric: Fabric,
    arbiter: BusArbiter,
    gc: Collector,
    /// Asserted while a GC cycle is in progress; cleared once `gc.phase()`
    /// returns to `Idle`. Drives each core's `gc_halted` flag per the
    /// drain rule (§4.11, §4.12): a core holding no lock halts immediately,
    /// a core holding a lock keeps running until it releases it.
    gc_halt_requested: bool,
    last_exception: Vec<Option<crate::runtime::exception::ExceptionKind>>,
}

impl Cluster {
    pub fn new(config: &Config, rom: MicrocodeRom, jump_table: crate::bytecode::jump_table::JumpTable) -> Self {
        let cores = (0..config.num_cores)
            .map(|id| {
                Core::new(
                    id,
                    config.stack_cache_banks,
                    config.stack_cache_bank_words,
                    0,
                    config.method_cache_block_bytes * config.method_cache_blocks,
                    config.method_cache_blocks,
                    config.method_cache_block_bytes,
                    config.object_cache_entries,
                    config.array_cache_entries,
                )
            })
            .collect();
        let fabric = match config.lock_fabric {
            LockFabricChoice::CmpSync => Fabric::CmpSync(CmpSync::new()),
            LockFabricChoice::Ihlu { slots } => Fabric::Ihlu(Ihlu::new(slots)),
        };
        let last_exception = vec![None; config.num_cores];
        Self {
            cores,
            mem: MainMemory::new(config.heap_words, config.mem_timing),
            heap: MainMemory::new(config.heap_words, config.mem_timing),
            handles: HandleTable::new(config.handle_capacity),
            rom,
            jump_table,
            fabric,
            arbiter: BusArbiter::new(config.num_cores),
            gc: Collector::new(
                config.heap_words as u32,
                config.mark_step,
                config.compact_step,
                config.gc_trigger_free_fraction,
            ),
            gc_halt_requested: false,
            last_exception,
        }
    }

    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }

    pub fn core(&self, id: usize) -> &Core {
        &self.cores[id]
    }

    pub fn core_mut(&mut self, id: usize) -> &mut Core {
        &mut self.cores[id]
    }

    pub fn mem_mut(&mut self) -> &mut MainMemory {
        &mut self.mem
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Advance the whole cluster by one cycle: every core steps against
    /// the shared resources and the round-robin bus grant it is due, core
    /// writes are fanned out over the snoop fabric, and the collector
    /// advances one increment if a cycle is in progress or due to start.
    pub fn step(&mut self) {
        let bus_requests: Vec<bool> = self
            .cores
            .iter()
            .map(|c| !matches!(c.mem_ctrl.state(), crate::mem_controller::State::Idle))
            .collect();
        let granted = self.arbiter.arbitrate(&bus_requests);

        let mut snoops: Vec<(usize, SnoopEvent)> = Vec::new();
        let core_count = self.cores.len();
        for (id, core) in self.cores.iter_mut().enumerate() {
            if self.gc_halt_requested {
                core.gc_halted = !self.fabric.gc_halt_exempt(id);
            }
            let bus_granted = granted == Some(id) || core_count <= 1;
            let out = core.step(
                bus_granted,
                &mut self.mem,
                &mut self.heap,
                &mut self.handles,
                &mut self.gc,
                &self.rom,
                &self.jump_table,
            );
            if !out.needs_bus {
                self.arbiter.release(id);
            }
            if out.exception.is_some() {
                self.last_exception[id] = out.exception;
            }
            for (handle, field_or_index) in out.snoop {
                snoops.push((
                    id,
                    SnoopEvent {
                        handle,
                        field_or_index: Some(field_or_index),
                    },
                ));
            }
        }

        for (source, event) in snoops {
            let num_cores = self.cores.len();
            broadcast(source, num_cores, event, |target, ev| {
                let core = &mut self.cores[target];
                if let Some(field) = ev.field_or_index {
                    core.object_cache.snoop_invalidate(ev.handle, field);
                    core.array_cache.snoop_invalidate(ev.handle, field);
                }
            });
        }

        self.step_gc();
    }

    fn step_gc(&mut self) {
        if !self.gc_halt_requested && self.gc.should_collect() {
            self.gc_halt_requested = true;
            let roots = self.conservative_roots();
            self.gc.begin_cycle(&mut self.handles, &roots);
        }
        if self.gc_halt_requested {
            let methods = crate::runtime::class::MethodTable::new();
            let phase = self
                .gc
                .tick(&mut self.heap, &mut self.handles, &methods, |_| 0);
            if phase == crate::gc::Phase::Idle {
                self.gc_halt_requested = false;
                for core in &mut self.cores {
                    core.gc_halted = false;
                }
            }
        }
    }

    /// Conservative stack scan (§4.15 "Root discovery"): every word
    /// currently resident in every core's stack cache that looks like it
    /// could be a handle (non-zero and within the handle table's address
    /// range) is treated as a root. Conservative by design — false
    /// positives only pin garbage for one extra cycle, they never corrupt
    /// the heap.
    fn conservative_roots(&self) -> Vec<u32> {
        let mut roots = Vec::new();
        let handle_bound = (self.handles.capacity() * crate::runtime::handle::HANDLE_WORDS) as u32;
        for core in &self.cores {
            if core.regs.a != 0 && (core.regs.a as u32) < handle_bound {
                roots.push(core.regs.a as u32);
            }
            if core.regs.b != 0 && (core.regs.b as u32) < handle_bound {
                roots.push(core.regs.b as u32);
            }
        }
        roots
    }
}

impl crate::debug::DebugTarget for Cluster {
    fn halt(&mut self, core: usize) {
        self.cores[core].debug_halted = true;
    }

    fn resume(&mut self, core: usize) {
        self.cores[core].debug_halted = false;
    }

    fn step_microcode(&mut self, core: usize) {
        self.cores[core].debug_halted = false;
        self.cores[core].step(
            true,
            &mut self.mem,
            &mut self.heap,
            &mut self.handles,
            &mut self.gc,
            &self.rom,
            &self.jump_table,
        );
        self.cores[core].debug_halted = true;
    }

    fn step_bytecode(&mut self, core: usize) {
        loop {
            let before = self.cores[core].bc.jpc();
            self.cores[core].debug_halted = false;
            let out = self.cores[core].step(
                true,
                &mut self.mem,
                &mut self.heap,
                &mut self.handles,
                &mut self.gc,
                &self.rom,
                &self.jump_table,
            );
            if out.retired || self.cores[core].bc.jpc() != before {
                break;
            }
        }
        self.cores[core].debug_halted = true;
    }

    fn read_registers(&self, core: usize) -> Vec<i32> {
        let regs = &self.cores[core].regs;
        vec![regs.pc as i32, regs.ir as i32, regs.a, regs.b, regs.sp as i32, regs.vp as i32, regs.mp as i32]
    }

    fn read_stack(&self, core: usize, base_logical_addr: u32, len: u32) -> Vec<i32> {
        let stack = &self.cores[core].stack;
        (0..len)
            .filter(|&i| stack.is_resident(base_logical_addr + i))
            .map(|i| stack.read(base_logical_addr + i))
            .collect()
    }

    fn read_memory(&self, addr: u32, len: u32) -> Vec<u32> {
        self.mem.read_block(addr, len)
    }

    fn write_memory(&mut self, addr: u32, data: &[u32]) {
        self.mem.write_block(addr, data);
    }

    fn set_breakpoint(&mut self, core: usize, microcode_pc: u16) {
        self.cores[core].set_breakpoint(microcode_pc);
    }

    fn clear_breakpoint(&mut self, core: usize, microcode_pc: u16) {
        self.cores[core].clear_breakpoint(microcode_pc);
    }

    fn query_breakpoint(&self, core: usize, microcode_pc: u16) -> bool {
        self.cores[core].has_breakpoint(microcode_pc)
    }

    fn is_halted(&self, core: usize) -> bool {
        self.cores[core].debug_halted
    }

    fn last_exception(&self, core: usize) -> Option<crate::runtime::exception::ExceptionKind> {
        self.last_exception[core]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugTarget;
    use crate::pipeline::microcode::MicroInstruction;

    fn tiny_cluster(num_cores: usize) -> Cluster {
        let config = Config {
            num_cores,
            heap_words: 256,
            handle_capacity: 16,
            ..Config::default()
        };
        let rom = MicrocodeRom::new(vec![MicroInstruction::NOP]);
        let jt = crate::bytecode::jump_table::JumpTable::new(0);
        Cluster::new(&config, rom, jt)
    }

    #[test]
    fn single_core_cluster_steps_without_panicking() {
        let mut cluster = tiny_cluster(1);
        for _ in 0..4 {
            cluster.step();
        }
        assert_eq!(cluster.num_cores(), 1);
    }

    #[test]
    fn multi_core_cluster_round_robins_the_bus() {
        let mut cluster = tiny_cluster(2);
        for _ in 0..8 {
            cluster.step();
        }
        assert_eq!(cluster.num_cores(), 2);
    }

    #[test]
    fn breakpoint_halts_the_core_at_that_microcode_pc() {
        let mut cluster = tiny_cluster(1);
        cluster.set_breakpoint(0, 0);
        cluster.step_microcode(0);
        assert!(cluster.query_breakpoint(0, 0));
        cluster.halt(0);
        assert!(cluster.is_halted(0));
        cluster.resume(0);
        assert!(!cluster.is_halted(0));
    }

    #[test]
    fn write_then_read_memory_roundtrips() {
        let mut cluster = tiny_cluster(1);
        cluster.write_memory(4, &[1, 2, 3]);
        assert_eq!(cluster.read_memory(4, 3), vec![1, 2, 3]);
    }
}
