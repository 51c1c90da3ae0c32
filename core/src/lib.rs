//! Cycle-accurate functional model of the JOP (Java Optimized Processor)
//! pipeline and its memory hierarchy: microcode-driven fetch/decode/execute,
//! a two-register top-of-stack with deep stack cache, a memory controller
//! state machine backed by semantic caches, an SMP fabric (arbiter, global
//! lock, per-object lock table, cache snoop), and an incremental
//! mark-compact collector over a handle-indirected heap.

pub mod bus;
pub mod bytecode;
pub mod cache;
pub mod config;
pub mod core;
pub mod debug;
pub mod gc;
pub mod io;
pub mod mem_controller;
pub mod memory;
pub mod pipeline;
pub mod runtime;
pub mod smp;

pub mod prelude {
    pub use crate::bus::BusMaster;
    pub use crate::config::Config;
    pub use crate::core::Core;
    pub use crate::runtime::exception::ExceptionKind;
    pub use crate::smp::cluster::Cluster;
}
