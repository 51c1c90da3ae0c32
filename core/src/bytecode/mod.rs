//! Bytecode-to-microcode frontend (§4.2): JPC, operand accumulation,
//! branch resolution, exception/interrupt injection, and the jump table
//! that turns a JVM opcode into a microcode start address.

pub mod fetch;
pub mod jump_table;
