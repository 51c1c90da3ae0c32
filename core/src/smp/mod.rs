//! SMP fabric (§4.9, §4.11-§4.13): the bus arbiter lives in `crate::bus`;
//! this module holds what is specific to a multi-core JOP cluster — the
//! two interchangeable global-lock backends, the cache snoop broadcast,
//! and the `Cluster` that ties every core to them plus the shared memory
//! hierarchy and collector.

pub mod cluster;
pub mod cmp_sync;
pub mod ihlu;
pub mod snoop;

use crate::runtime::monitor::LockFabric as _;

/// Selects which `runtime::monitor::LockFabric` backend a cluster runs,
/// mirroring `config::LockFabric` but holding the live instance rather
/// than just the policy choice.
pub enum Fabric {
    CmpSync(cmp_sync::CmpSync),
    Ihlu(ihlu::Ihlu),
}

impl Fabric {
    pub fn gc_halt_exempt(&self, core_id: usize) -> bool {
        match self {
            Fabric::CmpSync(lock) => lock.gc_halt_exempt(core_id),
            Fabric::Ihlu(lock) => lock.holds_any_lock(core_id),
        }
    }
}

impl crate::runtime::monitor::LockFabric for Fabric {
    fn try_lock(&mut self, core_id: usize, key: u32) -> crate::runtime::monitor::LockOutcome {
        match self {
            Fabric::CmpSync(lock) => lock.try_lock(core_id, key),
            Fabric::Ihlu(lock) => lock.try_lock(core_id, key),
        }
    }

    fn unlock(&mut self, core_id: usize, key: u32) {
        match self {
            Fabric::CmpSync(lock) => lock.unlock(core_id, key),
            Fabric::Ihlu(lock) => lock.unlock(core_id, key),
        }
    }
}
