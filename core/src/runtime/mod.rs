//! Minimal Java runtime: handle indirection, method descriptors, monitor
//! reentrancy, exception kinds, and the bytecode-image loader (§3, §4.15,
//! §4.16, §6).

pub mod class;
pub mod exception;
pub mod handle;
pub mod loader;
pub mod monitor;
