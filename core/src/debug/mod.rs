//! Debug transport (§6, optional): a framer/deframer operating on
//! in-process `&[u8]` buffers rather than a real socket — wiring an
//! actual byte stream is a frontend concern, not `core`'s.
//!
//! Frame layout: `{SYNC(0xA5), type, length(2, big-endian), core,
//! payload[length], CRC-8/MAXIM}`.

pub mod frame;

use crate::runtime::exception::ExceptionKind;

/// What `Cluster` must expose for the debug transport to drive it.
/// Implemented by `smp::cluster::Cluster`.
pub trait DebugTarget {
    fn halt(&mut self, core: usize);
    fn resume(&mut self, core: usize);
    fn step_microcode(&mut self, core: usize);
    fn step_bytecode(&mut self, core: usize);
    fn read_registers(&self, core: usize) -> Vec<i32>;
    fn read_stack(&self, core: usize, base_logical_addr: u32, len: u32) -> Vec<i32>;
    fn read_memory(&self, addr: u32, len: u32) -> Vec<u32>;
    fn write_memory(&mut self, addr: u32, data: &[u32]);
    fn set_breakpoint(&mut self, core: usize, microcode_pc: u16);
    fn clear_breakpoint(&mut self, core: usize, microcode_pc: u16);
    fn query_breakpoint(&self, core: usize, microcode_pc: u16) -> bool;
    fn is_halted(&self, core: usize) -> bool;
    fn last_exception(&self, core: usize) -> Option<ExceptionKind>;
}
