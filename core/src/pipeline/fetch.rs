//! Microcode fetch stage (§4.1): presents one microcode instruction per
//! cycle, with next-PC priority `jfetch` > branch > jump > PC+1. Freezing
//! (memory controller busy, debug halt) holds PC, IR, and all downstream
//! state; `Core::step` checks those conditions directly before computing
//! a next PC at all.

/// Compute the next microcode PC given this cycle's decode outputs.
/// Priority, highest first: `jfetch` (load the jump-table output for the
/// next bytecode) > branch target > jump field > PC+1.
pub fn next_pc(
    current_pc: u16,
    jfetch: bool,
    jfetch_target: u16,
    branch_take: bool,
    branch_target: u16,
    jump_target: Option<u16>,
) -> u16 {
    if jfetch {
        jfetch_target
    } else if branch_take {
        branch_target
    } else if let Some(target) = jump_target {
        target
    } else {
        current_pc.wrapping_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jfetch_has_highest_priority() {
        assert_eq!(next_pc(5, true, 100, true, 50, Some(20)), 100);
    }

    #[test]
    fn branch_beats_jump_when_not_jfetching() {
        assert_eq!(next_pc(5, false, 100, true, 50, Some(20)), 50);
    }

    #[test]
    fn jump_beats_increment() {
        assert_eq!(next_pc(5, false, 100, false, 50, Some(20)), 20);
    }

    #[test]
    fn default_is_pc_plus_one() {
        assert_eq!(next_pc(5, false, 100, false, 50, None), 6);
    }
}
