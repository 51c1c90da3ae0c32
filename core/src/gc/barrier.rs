//! Snapshot-at-beginning write barriers (§4.17): intercepts the three
//! reference-storing bytecodes and grays the value being overwritten
//! before it is lost, so a concurrent mark phase cannot miss an object
//! that was reachable at the start of the cycle.

/// Which bytecode triggered the barrier. Purely descriptive — all three
/// funnel into the same `Collector::write_barrier` call, kept distinct
/// here so callers/tests can assert on which path fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierSite {
    ReferenceArrayStore,
    ReferenceFieldStore,
    StaticReferenceStore,
}

/// Decide whether `old_value` needs to be grayed before being
/// overwritten. A zero handle is never tracked; live marking is
/// delegated to `Collector::write_barrier`, which also rejects handles
/// already on the gray list or already marked current.
pub fn needs_barrier(old_value: u32) -> bool {
    old_value != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_never_needs_a_barrier() {
        assert!(!needs_barrier(0));
    }

    #[test]
    fn nonzero_value_needs_a_barrier() {
        assert!(needs_barrier(8));
    }
}
