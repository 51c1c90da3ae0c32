//! Regenerates `tests/vectors/mem.json`: field store/load pairs at a
//! handful of field indices and handle sizes, grounding §8 scenario 2
//! ("Field store/load on single core").

use jop_conformance::{write_vectors, MemVector};

fn main() {
    let cases: &[(&str, u32, u32, i32)] = &[
        ("small object, field 0", 4, 0, 0x12345678),
        ("small object, last field", 4, 3, -1),
        ("large object, mid field", 16, 8, 0x7FFFFFFF),
    ];

    let vectors: Vec<MemVector> = cases
        .iter()
        .map(|&(desc, size, field, value)| MemVector {
            description: desc.to_string(),
            handle_size_words: size,
            field_index: field,
            store_value: value,
            expected_load: value,
        })
        .collect();

    let out = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/vectors/mem.json");
    write_vectors(&out, &vectors).expect("vector directory must exist");
    eprintln!("wrote {} memory vectors to {}", vectors.len(), out.display());
}
