//! Hardware and runtime exception taxonomy (§6 trap table, §4.16).
//!
//! Kinds raised asynchronously (null pointer, array bounds, lock-table-full)
//! arrive as an exception pulse from the memory controller or IHLU and are
//! serviced on the next bytecode-fetch cycle. Divide-by-zero is the one
//! exception that must be thrown synchronously from the arithmetic helper
//! that detects it, never via this pulse path, or JPC ends up pointing at
//! the wrong bytecode.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExceptionKind {
    NullPointer,
    ArrayIndexOutOfBounds,
    ArithmeticException,
    IllegalMonitorState,
    OutOfMemory,
    BusError,
}

impl ExceptionKind {
    /// Method-table offset of the Java helper that constructs and throws
    /// the pre-allocated exception object for this kind, relative to the
    /// runtime-helper method pointer. Fixed at 8 words, not 6 (§9 historical
    /// note: an earlier revision used 6 and misfired on helper classes with
    /// two extra synthetic methods ahead of the exception throwers).
    pub const HELPER_TABLE_OFFSET: u32 = 8;
}
