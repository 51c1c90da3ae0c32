//! Microcode ROM and jump-table image loaders (§6 "Microcode ROM image",
//! "jump table image"): both are flat big-endian 32-bit word streams,
//! parsed the same way `runtime::loader` parses the bytecode image.

use super::microcode::{AluOp, MemOpClass, MicroInstruction, MicrocodeRom, NextPc, StackOp};
use crate::bytecode::jump_table::JumpTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MicrocodeLoadError {
    Empty,
    Truncated { expected_words: usize, got_words: usize },
    UnknownAluTag(u32),
    UnknownMemOpTag(u32),
}

impl std::fmt::Display for MicrocodeLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MicrocodeLoadError::Empty => write!(f, "microcode image is empty"),
            MicrocodeLoadError::Truncated { expected_words, got_words } => write!(
                f,
                "microcode image truncated: header implies {expected_words} words, got {got_words}"
            ),
            MicrocodeLoadError::UnknownAluTag(tag) => write!(f, "unknown ALU op tag {tag}"),
            MicrocodeLoadError::UnknownMemOpTag(tag) => write!(f, "unknown mem-op class tag {tag}"),
        }
    }
}

impl std::error::Error for MicrocodeLoadError {}

fn words_from_be_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn decode_alu(tag: u32, immediate: i32) -> Result<AluOp, MicrocodeLoadError> {
    Ok(match tag {
        0 => AluOp::Add,
        1 => AluOp::Sub,
        2 => AluOp::And,
        3 => AluOp::Or,
        4 => AluOp::Xor,
        5 => AluOp::ShiftLeft,
        6 => AluOp::ShiftRight,
        7 => AluOp::ShiftRightUnsigned,
        8 => AluOp::Eq,
        9 => AluOp::Lt,
        10 => AluOp::Mul,
        11 => AluOp::PassB,
        12 => AluOp::Immediate(immediate),
        13 => AluOp::Div,
        14 => AluOp::Rem,
        other => return Err(MicrocodeLoadError::UnknownAluTag(other)),
    })
}

fn decode_mem_op(tag: u32) -> Result<MemOpClass, MicrocodeLoadError> {
    Ok(match tag {
        0 => MemOpClass::None,
        1 => MemOpClass::RawRead,
        2 => MemOpClass::RawWrite,
        3 => MemOpClass::GetField,
        4 => MemOpClass::PutField,
        5 => MemOpClass::IaLoad,
        6 => MemOpClass::IaStore,
        7 => MemOpClass::MethodFill,
        8 => MemOpClass::MemCopy,
        other => return Err(MicrocodeLoadError::UnknownMemOpTag(other)),
    })
}

/// Control-word bit layout: bits 0-3 ALU tag, bit 4 opd_fetch, bit 5
/// jfetch, bit 6 jopdfetch, bits 7-8 stack-op, bits 9-12 mem-op class,
/// bit 13 is_branch, bit 14 has-jump-target, bits 15-25 jump target (11
/// bits). Each entry occupies two words: the control word followed by
/// the ALU immediate (0 when the tag isn't `Immediate`).
pub fn load_microcode_rom(bytes: &[u8]) -> Result<MicrocodeRom, MicrocodeLoadError> {
    if bytes.is_empty() {
        return Err(MicrocodeLoadError::Empty);
    }
    let words = words_from_be_bytes(bytes);
    if words.is_empty() {
        return Err(MicrocodeLoadError::Truncated { expected_words: 1, got_words: 0 });
    }
    let count = words[0] as usize;
    let expected = 1 + count * 2;
    if words.len() < expected {
        return Err(MicrocodeLoadError::Truncated {
            expected_words: expected,
            got_words: words.len(),
        });
    }

    let mut instrs = Vec::with_capacity(count);
    for i in 0..count {
        let control = words[1 + i * 2];
        let immediate = words[2 + i * 2] as i32;

        let alu_op = decode_alu(control & 0xF, immediate)?;
        let opd_fetch = (control >> 4) & 1 != 0;
        let jfetch = (control >> 5) & 1 != 0;
        let jopdfetch = (control >> 6) & 1 != 0;
        let stack_op = match (control >> 7) & 0x3 {
            1 => StackOp::Push,
            2 => StackOp::Pop,
            _ => StackOp::None,
        };
        let mem_op = decode_mem_op((control >> 9) & 0xF)?;
        let is_branch = (control >> 13) & 1 != 0;
        let has_jump = (control >> 14) & 1 != 0;
        let jump_target = has_jump.then(|| ((control >> 15) & 0x7FF) as u16);

        instrs.push(MicroInstruction {
            alu_op,
            next: NextPc { jump_target, is_branch },
            stack_op,
            mem_op,
            opd_fetch,
            jfetch,
            jopdfetch,
        });
    }
    Ok(MicrocodeRom::new(instrs))
}

/// Jump table image: 256 big-endian 32-bit words, each a microcode start
/// address truncated to its low 16 bits.
pub fn load_jump_table(bytes: &[u8], default_trap: u16) -> Result<JumpTable, MicrocodeLoadError> {
    let words = words_from_be_bytes(bytes);
    if words.len() < 256 {
        return Err(MicrocodeLoadError::Truncated {
            expected_words: 256,
            got_words: words.len(),
        });
    }
    let mut table = JumpTable::new(default_trap);
    for (opcode, &word) in words.iter().take(256).enumerate() {
        table.set(opcode as u8, word as u16);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn loads_a_single_alu_instruction() {
        let control = 0u32 /* Add */ | (1 << 7) /* Push */;
        let bytes = image(&[1, control, 0]);
        let rom = load_microcode_rom(&bytes).unwrap();
        let instr = rom.fetch(0);
        assert_eq!(instr.alu_op, AluOp::Add);
        assert_eq!(instr.stack_op, StackOp::Push);
    }

    #[test]
    fn immediate_alu_op_carries_its_payload() {
        let control = 12u32; // Immediate tag
        let bytes = image(&[1, control, 77]);
        let rom = load_microcode_rom(&bytes).unwrap();
        assert_eq!(rom.fetch(0).alu_op, AluOp::Immediate(77));
    }

    #[test]
    fn truncated_microcode_image_is_rejected() {
        let bytes = image(&[2, 0, 0]); // claims 2 entries, only has 1
        assert!(matches!(
            load_microcode_rom(&bytes),
            Err(MicrocodeLoadError::Truncated { .. })
        ));
    }

    #[test]
    fn jump_table_image_loads_256_entries() {
        let mut words = vec![0u32; 256];
        words[0x60] = 42;
        let bytes = image(&words);
        let table = load_jump_table(&bytes, 0xFFFF).unwrap();
        assert_eq!(table.lookup(0x60), 42);
        assert_eq!(table.lookup(0x61), 0);
    }

    #[test]
    fn short_jump_table_image_is_rejected() {
        let bytes = image(&[0u32; 10]);
        assert!(load_jump_table(&bytes, 0).is_err());
    }
}
