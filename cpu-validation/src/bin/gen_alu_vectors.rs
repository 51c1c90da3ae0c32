//! Regenerates `tests/vectors/alu.json`: one entry per ALU op, exercising
//! the integer-minimum boundary case from §8 alongside ordinary operands,
//! plus a batch of randomized operand pairs per op to widen coverage
//! beyond the hand-picked cases.

use jop_conformance::{write_vectors, AluVector};
use rand::Rng;

const RANDOM_CASES_PER_OP: usize = 20;
const OPS: &[&str] = &["add", "sub", "and", "or", "xor", "shl", "shr", "eq", "lt"];

fn main() {
    let cases: &[(&str, i32, i32)] = &[
        ("add", 0x2A, 0x11),
        ("add", i32::MIN, -1),
        ("sub", 10, 3),
        ("and", 0xFF, 0x0F),
        ("or", 0xF0, 0x0F),
        ("xor", 0xFF, 0x0F),
        ("shl", 1, 4),
        ("shr", -8, 1),
        ("eq", 5, 5),
        ("lt", 3, 5),
    ];

    let mut vectors: Vec<AluVector> = cases
        .iter()
        .map(|&(op, a, b)| AluVector {
            op: op.to_string(),
            a,
            b,
            expected: reference(op, a, b),
        })
        .collect();

    let mut rng = rand::thread_rng();
    for &op in OPS {
        for _ in 0..RANDOM_CASES_PER_OP {
            let a: i32 = rng.r#gen();
            let b: i32 = if op == "shl" || op == "shr" { rng.gen_range(0..32) } else { rng.r#gen() };
            vectors.push(AluVector {
                op: op.to_string(),
                a,
                b,
                expected: reference(op, a, b),
            });
        }
    }

    let out = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/vectors/alu.json");
    write_vectors(&out, &vectors).expect("vector directory must exist");
    eprintln!("wrote {} ALU vectors to {}", vectors.len(), out.display());
}

/// Independent re-derivation of each op's expected result, so the
/// generated vector doesn't just echo whatever `pipeline::execute` did.
fn reference(op: &str, a: i32, b: i32) -> i32 {
    match op {
        "add" => a.wrapping_add(b),
        "sub" => a.wrapping_sub(b),
        "and" => a & b,
        "or" => a | b,
        "xor" => a ^ b,
        "shl" => a.wrapping_shl(b as u32),
        "shr" => a.wrapping_shr(b as u32),
        "eq" => (a == b) as i32,
        "lt" => (a < b) as i32,
        other => panic!("unknown op {other}"),
    }
}
