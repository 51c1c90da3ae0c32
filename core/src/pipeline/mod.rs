//! The 3-stage microcode pipeline (§4.1-§4.4): fetch, decode, execute over
//! a two-register top-of-stack backed by a banked stack cache.

pub mod decode;
pub mod execute;
pub mod fetch;
pub mod microcode;
pub mod registers;
pub mod rom_loader;
pub mod stack_cache;
