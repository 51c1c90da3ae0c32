//! Fixture bytecode images, one per registered `FixtureEntry`, grounded
//! on the teacher's per-machine ROM modules (each a `fn` that returns a
//! byte blob, registered with `inventory::submit!`).

use crate::asm::Program;
use crate::registry::FixtureEntry;

fn integer_add() -> Vec<u8> {
    let mut p = Program::new();
    p.bipush(4).bipush(6).iadd().ireturn();
    p.image()
}

inventory::submit! {
    FixtureEntry {
        name: "integer_add",
        description: "push two small integers, add them, return",
        build: integer_add,
    }
}

fn field_roundtrip() -> Vec<u8> {
    let mut p = Program::new();
    p.bipush(9)
        .putfield(0)
        .bipush(0)
        .getfield(0)
        .ireturn();
    p.image()
}

inventory::submit! {
    FixtureEntry {
        name: "field_roundtrip",
        description: "store a field then load it back",
        build: field_roundtrip,
    }
}

fn array_bounds() -> Vec<u8> {
    let mut p = Program::new();
    p.bipush(0) // array handle placeholder
        .bipush(3)
        .iastore()
        .bipush(0)
        .iaload()
        .ireturn();
    p.image()
}

inventory::submit! {
    FixtureEntry {
        name: "array_bounds",
        description: "store then load an array element at a fixed index",
        build: array_bounds,
    }
}

fn loop_sum() -> Vec<u8> {
    let mut p = Program::new();
    // local 0: running total, local 1: countdown. Loop body is 15 bytes
    // (iload*2 + iadd + istore + iload + bipush*2 + isub + istore + iload
    // + bipush + if_icmp_gt), so the back-branch offset is -15.
    p.bipush(0)
        .istore(0)
        .bipush(5)
        .istore(1)
        .iload(0)
        .iload(1)
        .iadd()
        .istore(0)
        .iload(1)
        .bipush(1)
        .isub()
        .istore(1)
        .iload(1)
        .bipush(0)
        .if_icmp_gt(-15)
        .iload(0)
        .ireturn();
    p.image()
}

inventory::submit! {
    FixtureEntry {
        name: "loop_sum",
        description: "sum a countdown loop body, exercising repeated branch-back dispatch",
        build: loop_sum,
    }
}

fn monitor_enter_exit() -> Vec<u8> {
    let mut p = Program::new();
    p.bipush(0)
        .monitorenter()
        .bipush(1)
        .bipush(1)
        .iadd()
        .pop()
        .bipush(0)
        .monitorexit()
        .ireturn();
    p.image()
}

inventory::submit! {
    FixtureEntry {
        name: "monitor_enter_exit",
        description: "acquire and release a monitor around a small critical section",
        build: monitor_enter_exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn every_fixture_produces_a_non_empty_image() {
        for entry in registry::all() {
            let image = (entry.build)();
            assert!(image.len() > 4, "fixture {} produced an empty image", entry.name);
        }
    }
}
