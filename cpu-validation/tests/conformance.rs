//! Drives the generated golden vectors against the reference model
//! pieces they exercise: ALU vectors against `pipeline::execute::apply`,
//! memory vectors against the object cache's store/lookup write-through
//! path (§8 scenarios 1 and 2).

use jop_conformance::{AluVector, MemVector};
use jop_core::cache::ObjectCache;
use jop_core::pipeline::execute::apply;
use jop_core::pipeline::microcode::AluOp;
use jop_core::pipeline::registers::Registers;

fn alu_op(name: &str) -> AluOp {
    match name {
        "add" => AluOp::Add,
        "sub" => AluOp::Sub,
        "and" => AluOp::And,
        "or" => AluOp::Or,
        "xor" => AluOp::Xor,
        "shl" => AluOp::ShiftLeft,
        "shr" => AluOp::ShiftRight,
        "eq" => AluOp::Eq,
        "lt" => AluOp::Lt,
        other => panic!("unrecognized vector op {other}"),
    }
}

#[test]
fn alu_vectors_match_the_reference_model() {
    let raw = include_str!("vectors/alu.json");
    let vectors: Vec<AluVector> = serde_json::from_str(raw).unwrap();
    assert!(!vectors.is_empty());

    for v in vectors {
        let mut regs = Registers::new();
        regs.push(v.b);
        regs.push(v.a);
        apply(alu_op(&v.op), &mut regs);
        assert_eq!(regs.a, v.expected, "op {} with operands {} {}", v.op, v.a, v.b);
    }
}

#[test]
fn mem_vectors_round_trip_through_the_object_cache() {
    let raw = include_str!("vectors/mem.json");
    let vectors: Vec<MemVector> = serde_json::from_str(raw).unwrap();
    assert!(!vectors.is_empty());

    for v in vectors {
        let mut cache = ObjectCache::new(16);
        let handle = 8u32;
        cache.fill(handle, v.field_index, v.store_value);
        assert!(cache.store(handle, v.field_index, v.store_value));
        assert_eq!(cache.lookup(handle, v.field_index), Some(v.expected_load), "{}", v.description);
    }
}
