//! Execute stage (§4.4 "Stack / ALU"): updates A, B, flags, SP, VP, MP,
//! scratch from the microcode word Decode has already turned into
//! control signals. The multiplier is a radix-4 Booth iterative unit that
//! produces its result only after a fixed number of cycles; every other
//! ALU op completes in the cycle it is issued.

use super::microcode::AluOp;
use super::registers::{Flags, Registers};
use crate::runtime::exception::ExceptionKind;

/// Booth radix-4 multiply cycle count fixed by the hardware's iteration
/// count for a 32-bit operand, two bits retired per cycle.
pub const MUL_CYCLES: u32 = 16;

/// Tracks an in-flight multi-cycle multiply so `step` can report busy
/// until it completes, mirroring the memory controller's busy contract.
#[derive(Default)]
pub struct Multiplier {
    remaining: u32,
    operand_a: i32,
    operand_b: i32,
}

impl Multiplier {
    pub fn is_busy(&self) -> bool {
        self.remaining > 0
    }

    pub fn start(&mut self, a: i32, b: i32) {
        self.remaining = MUL_CYCLES;
        self.operand_a = a;
        self.operand_b = b;
    }

    /// Advance one cycle. Returns the product once the iteration
    /// completes (Booth's algorithm and a plain `wrapping_mul` agree on
    /// the final two's-complement result; the decomposition into partial
    /// products is the detail real hardware needs and this model does not
    /// re-derive, since only the cycle count and final value are
    /// observable at this layer).
    pub fn tick(&mut self) -> Option<i32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            Some(self.operand_a.wrapping_mul(self.operand_b))
        } else {
            None
        }
    }
}

/// Apply a single-cycle ALU op, writing the result back to `a` (with `b`
/// taking the prior `a` per the push/shift convention) and recomputing
/// flags. `Mul` is handled by the caller via `Multiplier` and must not
/// reach here. `Div`/`Rem` by zero raise synchronously rather than
/// writing a result, matching real hardware's integer-divide exception
/// (§7, §8 hazard 6: divide-by-zero must throw from the helper itself,
/// not the async hardware-exception path).
pub fn apply(op: AluOp, regs: &mut Registers) -> Option<ExceptionKind> {
    let lhs = regs.a;
    let rhs = regs.b;
    let result = match op {
        AluOp::Add => lhs.wrapping_add(rhs),
        AluOp::Sub => rhs.wrapping_sub(lhs),
        AluOp::And => lhs & rhs,
        AluOp::Or => lhs | rhs,
        AluOp::Xor => lhs ^ rhs,
        AluOp::ShiftLeft => rhs.wrapping_shl(lhs as u32 & 0x1F),
        AluOp::ShiftRight => rhs.wrapping_shr(lhs as u32 & 0x1F),
        AluOp::ShiftRightUnsigned => ((rhs as u32).wrapping_shr(lhs as u32 & 0x1F)) as i32,
        AluOp::Eq => (rhs == lhs) as i32,
        AluOp::Lt => (rhs < lhs) as i32,
        AluOp::Div => {
            if lhs == 0 {
                return Some(ExceptionKind::ArithmeticException);
            }
            rhs.wrapping_div(lhs)
        }
        AluOp::Rem => {
            if lhs == 0 {
                return Some(ExceptionKind::ArithmeticException);
            }
            rhs.wrapping_rem(lhs)
        }
        AluOp::PassB => rhs,
        AluOp::Immediate(v) => v,
        AluOp::Mul => unreachable!("multiply goes through Multiplier, not apply()"),
    };
    regs.flags = Flags {
        zero: result == 0,
        negative: result < 0,
        eq: result == 0,
        lt: result < 0,
    };
    regs.a = result;
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_computes_flags() {
        let mut regs = Registers::new();
        regs.push(5);
        regs.push(-5);
        apply(AluOp::Add, &mut regs);
        assert_eq!(regs.a, 0);
        assert!(regs.flags.zero);
    }

    #[test]
    fn div_by_zero_raises_arithmetic_exception_without_writing_a_result() {
        let mut regs = Registers::new();
        regs.push(10); // b = value1
        regs.push(0); // a = value2 (divisor)
        let before = regs.a;
        let kind = apply(AluOp::Div, &mut regs);
        assert_eq!(kind, Some(ExceptionKind::ArithmeticException));
        assert_eq!(regs.a, before);
    }

    #[test]
    fn rem_by_zero_raises_arithmetic_exception() {
        let mut regs = Registers::new();
        regs.push(10);
        regs.push(0);
        assert_eq!(apply(AluOp::Rem, &mut regs), Some(ExceptionKind::ArithmeticException));
    }

    #[test]
    fn div_int_min_by_minus_one_wraps_instead_of_panicking() {
        let mut regs = Registers::new();
        regs.push(i32::MIN); // value1
        regs.push(-1); // value2 (divisor)
        assert_eq!(apply(AluOp::Div, &mut regs), None);
        assert_eq!(regs.a, i32::MIN);
    }

    #[test]
    fn div_computes_value1_over_value2() {
        let mut regs = Registers::new();
        regs.push(7);
        regs.push(2);
        apply(AluOp::Div, &mut regs);
        assert_eq!(regs.a, 3);
    }

    #[test]
    fn rem_computes_value1_mod_value2() {
        let mut regs = Registers::new();
        regs.push(7);
        regs.push(2);
        apply(AluOp::Rem, &mut regs);
        assert_eq!(regs.a, 1);
    }

    #[test]
    fn multiplier_completes_after_fixed_cycles() {
        let mut mul = Multiplier::default();
        mul.start(6, 7);
        let mut product = None;
        for _ in 0..MUL_CYCLES {
            product = mul.tick();
        }
        assert_eq!(product, Some(42));
        assert!(!mul.is_busy());
    }

    #[test]
    fn multiplier_is_busy_until_final_cycle() {
        let mut mul = Multiplier::default();
        mul.start(3, 4);
        for _ in 0..MUL_CYCLES - 1 {
            assert!(mul.tick().is_none());
        }
    }
}
