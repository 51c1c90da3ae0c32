//! Golden-vector schema shared by the vector generator binaries and the
//! conformance test suite: a vector is an input state plus the output
//! state the reference model is expected to reach, serialized so the
//! suite can be regenerated without recompiling the test binary.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AluVector {
    pub op: String,
    pub a: i32,
    pub b: i32,
    pub expected: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemVector {
    pub description: String,
    pub handle_size_words: u32,
    pub field_index: u32,
    pub store_value: i32,
    pub expected_load: i32,
}

pub fn write_vectors<T: Serialize>(path: &std::path::Path, vectors: &[T]) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(vectors).expect("vector set is always serializable");
    std::fs::write(path, json)
}
