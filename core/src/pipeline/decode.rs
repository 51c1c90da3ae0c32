//! Decode stage (§4.3): combinationally turns the current microcode word
//! into control signals for Execute, enforcing the two mutual exclusions
//! per cycle (at most one memory-op class; at most one of
//! {branch-take, jump}).

use super::microcode::{MicroInstruction, NextPc};
use super::registers::Flags;

/// Control signals latched for next-cycle Execute, decoded combinationally
/// from the microcode word plus the current flag vector.
#[derive(Clone, Copy, Debug)]
pub struct Decoded {
    pub instr: MicroInstruction,
    /// Resolved branch-take, folding in the flag vector; mutually
    /// exclusive with a jump target per cycle.
    pub branch_take: bool,
}

/// Resolve one microcode word against the current flags. Panics (as a
/// hardware assertion would trip) if the word asserts both a branch and a
/// jump target, since Decode must never let that reach Execute.
pub fn decode(instr: MicroInstruction, flags: Flags) -> Decoded {
    let NextPc { jump_target, is_branch } = instr.next;
    assert!(
        !(is_branch && jump_target.is_some()),
        "microcode word asserts both branch-take and jump in the same cycle"
    );
    let branch_take = is_branch && (flags.eq || flags.lt || flags.zero || flags.negative);
    Decoded { instr, branch_take }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::microcode::AluOp;

    #[test]
    #[should_panic]
    fn branch_and_jump_together_is_rejected() {
        let instr = MicroInstruction {
            alu_op: AluOp::PassB,
            next: NextPc {
                jump_target: Some(4),
                is_branch: true,
            },
            ..MicroInstruction::NOP
        };
        decode(instr, Flags::default());
    }

    #[test]
    fn branch_take_requires_a_true_flag() {
        let instr = MicroInstruction {
            next: NextPc {
                jump_target: None,
                is_branch: true,
            },
            ..MicroInstruction::NOP
        };
        assert!(!decode(instr, Flags::default()).branch_take);
        assert!(decode(instr, Flags { zero: true, ..Flags::default() }).branch_take);
    }
}
