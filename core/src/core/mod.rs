//! The per-core bundle (§2, §3, §4.1-§4.4): one microcode pipeline, its
//! bytecode frontend, its own semantic caches (method/object/array) and
//! bytecode RAM, and its own memory-controller instance. Everything here
//! is private to one core; `smp::cluster::Cluster` owns what is shared
//! (main memory, the handle table, the ROMs, the lock fabric) and drives
//! every `Core` through it one cycle at a time.

use crate::bytecode::fetch::{BranchKind, BytecodeFetch, Injection};
use crate::bytecode::jump_table::JumpTable;
use crate::cache::{ArrayCache, MethodCache, ObjectCache};
use crate::gc::Collector;
use crate::mem_controller::{request::MemRequest, Completion, MemController};
use crate::memory::MainMemory;
use crate::pipeline::decode::decode;
use crate::pipeline::execute::{apply, Multiplier};
use crate::pipeline::fetch::next_pc;
use crate::pipeline::microcode::{build_request, AluOp, MemOpClass, MicrocodeRom, StackOp};
use crate::pipeline::registers::Registers;
use crate::pipeline::stack_cache::StackCache;
use crate::runtime::exception::ExceptionKind;
use crate::runtime::handle::HandleTable;
use crate::runtime::monitor::MonitorUnit;

/// Reserved jump-table opcodes for exception and interrupt entry, outside
/// the 0-255 range of real JVM opcodes the loader ever emits, so they can
/// never collide with a bytecode the method actually contains.
pub const EXCEPTION_TRAP_OPCODE: u8 = 0xFF;
pub const INTERRUPT_TRAP_OPCODE: u8 = 0xFE;

/// What a `Core::step` produced this cycle, for `Cluster` to act on:
/// whether the bus is wanted, whether a bytecode instruction retired
/// (for debug single-step and Component::tick's "significant event"),
/// and any snoop/exception events to fan out.
#[derive(Default)]
pub struct StepOutput {
    pub needs_bus: bool,
    pub retired: bool,
    pub exception: Option<ExceptionKind>,
    pub snoop: Vec<(u32, u32)>,
}

pub struct Core {
    id: usize,
    pub regs: Registers,
    pub bc: BytecodeFetch,
    pub stack: StackCache,
    pub jbc: Vec<u8>,
    pub method_cache: MethodCache,
    pub object_cache: ObjectCache,
    pub array_cache: ArrayCache,
    pub mem_ctrl: MemController,
    pub monitor: MonitorUnit,
    multiplier: Multiplier,
    pub gc_halted: bool,
    pub debug_halted: bool,
    breakpoints: std::collections::HashSet<u16>,
}

impl Core {
    pub fn new(
        id: usize,
        stack_banks: usize,
        stack_bank_words: usize,
        stack_mem_base: u32,
        jbc_bytes: usize,
        method_cache_blocks: usize,
        method_cache_block_bytes: usize,
        object_cache_entries: usize,
        array_cache_entries: usize,
    ) -> Self {
        Self {
            id,
            regs: Registers::new(),
            bc: BytecodeFetch::new(),
            stack: StackCache::new(stack_banks, stack_bank_words, stack_mem_base),
            jbc: vec![0; jbc_bytes],
            method_cache: MethodCache::new(method_cache_blocks, method_cache_block_bytes),
            object_cache: ObjectCache::new(object_cache_entries),
            array_cache: ArrayCache::new(array_cache_entries),
            mem_ctrl: MemController::new(),
            monitor: MonitorUnit::new(),
            multiplier: Multiplier::default(),
            gc_halted: false,
            debug_halted: false,
            breakpoints: std::collections::HashSet::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn set_breakpoint(&mut self, microcode_pc: u16) {
        self.breakpoints.insert(microcode_pc);
    }

    pub fn clear_breakpoint(&mut self, microcode_pc: u16) {
        self.breakpoints.remove(&microcode_pc);
    }

    pub fn has_breakpoint(&self, microcode_pc: u16) -> bool {
        self.breakpoints.contains(&microcode_pc)
    }

    /// `true` while this core has any lock-related reason not to be
    /// drained by a GC-halt request (§4.11, §4.12 "drain rule") — i.e.
    /// it currently holds a monitor.
    pub fn holds_a_lock(&self) -> bool {
        self.monitor.depth() > 0
    }

    /// Advance this core by one cycle. `bus_granted` comes from the
    /// cluster's round-robin arbiter; `mem`/`heap`/`handles` are the
    /// resources shared across the whole cluster; `rom`/`jump_table` are
    /// the immutable microcode/bytecode-dispatch ROMs.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        bus_granted: bool,
        mem: &mut MainMemory,
        heap: &mut MainMemory,
        handles: &mut HandleTable,
        gc: &mut Collector,
        rom: &MicrocodeRom,
        jump_table: &JumpTable,
    ) -> StepOutput {
        let mut out = StepOutput::default();

        if self.debug_halted || (self.gc_halted && !self.holds_a_lock()) {
            return out;
        }

        if self.mem_ctrl.is_busy() {
            out.needs_bus = self.mem_ctrl_needs_bus();
            let completion = self.mem_ctrl.step(
                bus_granted,
                mem,
                heap,
                &mut self.method_cache,
                &mut self.object_cache,
                &mut self.array_cache,
                handles,
                gc,
                &mut self.jbc,
            );
            self.apply_completion(&completion, &mut out);
            return out;
        }

        if self.breakpoints.contains(&self.regs.pc) {
            self.debug_halted = true;
            return out;
        }

        if self.multiplier.is_busy() {
            if let Some(product) = self.multiplier.tick() {
                self.regs.a = product;
            }
            return out;
        }

        let instr = rom.fetch(self.regs.pc);
        let decoded = decode(instr, self.regs.flags);

        if decoded.instr.jfetch {
            let injection = self.bc.take_pending();
            let opcode = match injection {
                Injection::Exception(kind) => {
                    out.exception = Some(kind);
                    EXCEPTION_TRAP_OPCODE
                }
                Injection::Interrupt(_) => INTERRUPT_TRAP_OPCODE,
                Injection::None => {
                    let byte = self.jbc.get(self.bc.jpc() as usize).copied().unwrap_or(0);
                    self.bc.fetch_instruction(byte);
                    self.bc.advance_jpc();
                    byte
                }
            };
            self.regs.pc = jump_table.lookup(opcode);
            return out;
        }

        if decoded.instr.jopdfetch {
            let byte = self.jbc.get(self.bc.jpc() as usize).copied().unwrap_or(0);
            self.bc.accumulate_operand(byte);
            self.bc.advance_jpc();
        }

        match decoded.instr.alu_op {
            AluOp::Mul => self.multiplier.start(self.regs.a, self.regs.b),
            op => {
                if let Some(kind) = apply(op, &mut self.regs) {
                    self.bc.raise(Injection::Exception(kind));
                    out.exception = Some(kind);
                }
            }
        }

        match decoded.instr.stack_op {
            StackOp::Push => {
                let addr = self.sp_addr();
                self.stack.ensure_resident(addr, mem);
                self.stack.write(addr, self.regs.a);
                self.regs.sp = self.regs.sp.wrapping_add(1);
            }
            StackOp::Pop => {
                self.regs.sp = self.regs.sp.wrapping_sub(1);
                let addr = self.sp_addr();
                self.stack.ensure_resident(addr, mem);
                let value = self.stack.read(addr);
                self.regs.pop_shift(value);
            }
            StackOp::None => {}
        }

        if decoded.instr.mem_op != MemOpClass::None {
            let req = self.build_request(decoded.instr.mem_op);
            if let Some(req) = req {
                out.needs_bus = true;
                if let Some(completion) =
                    self.mem_ctrl
                        .submit(req, &self.object_cache, &self.array_cache)
                {
                    self.apply_completion(&completion, &mut out);
                }
            }
        }

        self.regs.pc = next_pc(
            self.regs.pc,
            decoded.instr.jfetch,
            jump_table.lookup(self.bc.instr_reg()),
            decoded.branch_take,
            self.bc.branch_target(),
            decoded.instr.next.jump_target,
        );
        out.retired = decoded.instr.jfetch;
        out
    }

    fn sp_addr(&self) -> u32 {
        self.regs.mp as u32 + self.regs.sp as u32
    }

    /// Assemble a memory request from the top-of-stack convention this
    /// model uses for two/three-operand memory ops: the handle/address is
    /// `B`, the value or field/index selector is `A`, and a third operand
    /// (field index for `putfield`, array index for `iastore`) rides in
    /// scratch slot 0, the way the real decode stage stages an extra
    /// operand ahead of a multi-word memory op (§4.3).
    fn build_request(&self, class: MemOpClass) -> Option<MemRequest> {
        build_request(class, self.regs.b as u32, self.regs.a, self.regs.scratch[0] as u32)
    }

    fn mem_ctrl_needs_bus(&self) -> bool {
        !matches!(self.mem_ctrl.state(), crate::mem_controller::State::Idle)
    }

    fn apply_completion(&mut self, completion: &Completion, out: &mut StepOutput) {
        if let Some(value) = completion.result {
            self.regs.a = value;
        }
        if let Some(kind) = completion.exception {
            self.bc.raise(Injection::Exception(kind));
            out.exception = Some(kind);
        }
        out.snoop.extend(completion.snoop.iter().copied());
    }

    /// Resolve a conditional branch opcode's taken/not-taken outcome
    /// against the current flags, for the frontend to fold into its next
    /// `jfetch` target selection.
    pub fn branch_taken(&self, kind: BranchKind) -> bool {
        kind.taken(self.regs.flags.eq, self.regs.flags.lt)
    }
}
