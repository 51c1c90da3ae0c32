//! Integration coverage for the fetch/decode/execute pipeline driven
//! through `Core::step`, focused on the stall-freeze contract (§8 "`jopd`
//! is bit-identical across any stall window of arbitrary length",
//! regression for bug #29) and multi-instruction retirement.

use jop_core::bytecode::jump_table::JumpTable;
use jop_core::core::Core;
use jop_core::gc::Collector;
use jop_core::memory::{MainMemory, MemTiming};
use jop_core::pipeline::microcode::{MemOpClass, MicroInstruction, MicrocodeRom};
use jop_core::runtime::handle::HandleTable;

fn env() -> (MainMemory, MainMemory, HandleTable, Collector, JumpTable) {
    (
        MainMemory::new(256, MemTiming::Bram),
        MainMemory::new(256, MemTiming::Bram),
        HandleTable::new(8),
        Collector::new(256, 8, 4, 0.25),
        JumpTable::new(0),
    )
}

#[test]
fn microcode_pc_and_bytecode_pc_hold_across_a_multi_cycle_memory_stall() {
    let mut core = Core::new(0, 4, 16, 0, 256, 16, 64, 16, 16);
    core.regs.b = 1; // handle address the GetField miss will chase
    let rom = MicrocodeRom::new(vec![MicroInstruction {
        mem_op: MemOpClass::GetField,
        ..MicroInstruction::NOP
    }]);
    let (mut mem, mut heap, mut handles, mut gc, jt) = env();

    core.step(true, &mut mem, &mut heap, &mut handles, &mut gc, &rom, &jt);
    assert!(core.mem_ctrl.is_busy(), "a handle-table miss must not resolve combinationally");

    let pc_during_stall = core.regs.pc;
    let jpc_during_stall = core.bc.jpc();
    for _ in 0..8 {
        if !core.mem_ctrl.is_busy() {
            break;
        }
        core.step(true, &mut mem, &mut heap, &mut handles, &mut gc, &rom, &jt);
        assert_eq!(core.regs.pc, pc_during_stall, "microcode PC must not advance while stalled");
        assert_eq!(core.bc.jpc(), jpc_during_stall, "jopd/jpc must not advance while stalled");
    }
}

#[test]
fn successive_jfetch_instructions_walk_the_jump_table_and_advance_jpc() {
    let mut core = Core::new(0, 4, 16, 0, 256, 16, 64, 16, 16);
    core.jbc[0] = 0x10;
    core.jbc[1] = 0x20;
    let mut jt = JumpTable::new(0);
    jt.set(0x10, 5);
    jt.set(0x20, 9);
    let rom = MicrocodeRom::new(vec![MicroInstruction {
        ..MicroInstruction::NOP
    }
    .with_jfetch()]);
    let (mut mem, mut heap, mut handles, mut gc, _) = env();

    let out = core.step(true, &mut mem, &mut heap, &mut handles, &mut gc, &rom, &jt);
    assert!(out.retired);
    assert_eq!(core.regs.pc, 5);
    assert_eq!(core.bc.jpc(), 1);

    // Second bytecode fetch needs a ROM entry at address 5 that also
    // jfetches, standing in for the microcode sequence that would
    // normally sit between two bytecode dispatches.
    let rom2 = MicrocodeRom::new({
        let mut instrs = vec![MicroInstruction::NOP; 5];
        instrs.push(MicroInstruction::NOP.with_jfetch());
        instrs
    });
    let out2 = core.step(true, &mut mem, &mut heap, &mut handles, &mut gc, &rom2, &jt);
    assert!(out2.retired);
    assert_eq!(core.regs.pc, 9);
    assert_eq!(core.bc.jpc(), 2);
}

trait WithJfetch {
    fn with_jfetch(self) -> Self;
}

impl WithJfetch for MicroInstruction {
    fn with_jfetch(mut self) -> Self {
        self.jfetch = true;
        self
    }
}
