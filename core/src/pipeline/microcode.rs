//! Microcode ROM entry encoding (§3 "Microcode ROM entry") and the
//! immutable ROM image loaded at simulator start (§6).

use crate::mem_controller::request::MemRequest;

/// How the ALU drives the next value into A (with B shifting from the
/// old A as usual).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
    Eq,
    Lt,
    /// Booth radix-4 iterative multiply; takes several cycles (§4.4).
    Mul,
    /// Single-cycle integer divide; raises `ArithmeticException`
    /// synchronously on a zero divisor instead of producing a result.
    Div,
    /// Single-cycle integer remainder; same divide-by-zero behavior as
    /// `Div`.
    Rem,
    /// Pass B through unmodified (no-op ALU write-back).
    PassB,
    /// Pass an immediate operand through.
    Immediate(i32),
}

/// Which memory-operation class, if any, Decode presents this cycle.
/// Mutually exclusive with every other memory-op class per cycle (§4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOpClass {
    None,
    RawRead,
    RawWrite,
    GetField,
    PutField,
    IaLoad,
    IaStore,
    MethodFill,
    MemCopy,
}

/// Next-PC hint, highest priority first when combined with fetch-stage
/// state (§4.1): `jfetch` > branch > jump > PC+1. `jfetch` and branch/jump
/// are carried as separate bits so Decode can assert at most one of
/// {branch-take, jump} per its own mutual-exclusion rule (§4.3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NextPc {
    pub jump_target: Option<u16>,
    pub is_branch: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackOp {
    None,
    Push,
    Pop,
}

/// One microcode word.
#[derive(Clone, Copy, Debug)]
pub struct MicroInstruction {
    pub alu_op: AluOp,
    pub next: NextPc,
    pub stack_op: StackOp,
    pub mem_op: MemOpClass,
    /// Request bytecode-operand accumulation this cycle.
    pub opd_fetch: bool,
    /// Request a bytecode-fetch (`jfetch`) for the next bytecode.
    pub jfetch: bool,
    /// Request an operand-byte bytecode-fetch (`jopdfetch`).
    pub jopdfetch: bool,
}

impl MicroInstruction {
    pub const NOP: Self = Self {
        alu_op: AluOp::PassB,
        next: NextPc {
            jump_target: None,
            is_branch: false,
        },
        stack_op: StackOp::None,
        mem_op: MemOpClass::None,
        opd_fetch: false,
        jfetch: false,
        jopdfetch: false,
    };
}

/// Turn a microcode `MemOpClass` plus the scratch operands Decode has
/// assembled into the concrete request the memory controller expects.
/// Kept here (rather than in `mem_controller`) since assembling the
/// request from register-file operands is Decode's job, not the
/// controller's.
pub fn build_request(
    class: MemOpClass,
    addr_or_handle: u32,
    value_or_field: i32,
    len: u32,
) -> Option<MemRequest> {
    match class {
        MemOpClass::None => None,
        MemOpClass::RawRead => Some(MemRequest::RawRead { addr: addr_or_handle }),
        MemOpClass::RawWrite => Some(MemRequest::RawWrite {
            addr: addr_or_handle,
            value: value_or_field,
        }),
        MemOpClass::GetField => Some(MemRequest::GetField {
            handle: addr_or_handle,
            field: value_or_field as u32,
        }),
        MemOpClass::PutField => Some(MemRequest::PutField {
            handle: addr_or_handle,
            field: len,
            value: value_or_field,
        }),
        MemOpClass::IaLoad => Some(MemRequest::IaLoad {
            handle: addr_or_handle,
            index: value_or_field as u32,
        }),
        MemOpClass::IaStore => Some(MemRequest::IaStore {
            handle: addr_or_handle,
            index: len,
            value: value_or_field,
        }),
        MemOpClass::MethodFill => Some(MemRequest::MethodFill {
            start_addr: addr_or_handle,
            len_bytes: len,
        }),
        MemOpClass::MemCopy => Some(MemRequest::MemCopy {
            src: addr_or_handle,
            dst: value_or_field as u32,
            len,
        }),
    }
}

/// The immutable microcode ROM: a flat list of instructions indexed by
/// microcode PC, loaded once at simulator start.
pub struct MicrocodeRom {
    words: Vec<MicroInstruction>,
}

impl MicrocodeRom {
    pub fn new(words: Vec<MicroInstruction>) -> Self {
        Self { words }
    }

    pub fn fetch(&self, pc: u16) -> MicroInstruction {
        self.words.get(pc as usize).copied().unwrap_or(MicroInstruction::NOP)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_fetch_out_of_range_returns_nop() {
        let rom = MicrocodeRom::new(vec![MicroInstruction::NOP]);
        let instr = rom.fetch(5);
        assert_eq!(instr.mem_op, MemOpClass::None);
    }
}
