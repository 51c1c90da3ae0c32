//! Integration coverage for the memory controller state machine against
//! plain main memory, independent of any particular cache or pipeline
//! wiring (§4.5, §8 round-trip law "push/pop" analogue for raw memory).

use jop_core::cache::{ArrayCache, MethodCache, ObjectCache};
use jop_core::gc::Collector;
use jop_core::mem_controller::request::MemRequest;
use jop_core::mem_controller::{MemController, State};
use jop_core::memory::{MainMemory, MemTiming};
use jop_core::runtime::handle::HandleTable;

fn drive(ctrl: &mut MemController, mem: &mut MainMemory, heap: &mut MainMemory) -> jop_core::mem_controller::Completion {
    let mut method_cache = MethodCache::new(16, 64);
    let mut object_cache = ObjectCache::new(16);
    let mut array_cache = ArrayCache::new(16);
    let mut handles = HandleTable::new(16);
    let mut gc = Collector::new(256, 8, 4, 0.25);
    let mut jbc = vec![0u8; 16];
    let mut last = jop_core::mem_controller::Completion::default();
    while ctrl.is_busy() {
        last = ctrl.step(
            true,
            mem,
            heap,
            &mut method_cache,
            &mut object_cache,
            &mut array_cache,
            &mut handles,
            &mut gc,
            &mut jbc,
        );
    }
    last
}

#[test]
fn raw_write_then_raw_read_round_trips() {
    let mut mem = MainMemory::new(256, MemTiming::Bram);
    let mut heap = MainMemory::new(256, MemTiming::Bram);
    let mut ctrl = MemController::new();

    assert!(ctrl.submit(MemRequest::RawWrite { addr: 10, value: 0x2A }, &ObjectCache::new(1), &ArrayCache::new(1)).is_none());
    drive(&mut ctrl, &mut mem, &mut heap);
    assert_eq!(ctrl.state(), State::Idle);

    assert!(ctrl.submit(MemRequest::RawRead { addr: 10 }, &ObjectCache::new(1), &ArrayCache::new(1)).is_none());
    let completion = drive(&mut ctrl, &mut mem, &mut heap);
    assert_eq!(completion.result, Some(0x2A));
}

#[test]
fn controller_holds_state_while_bus_not_granted() {
    let mut mem = MainMemory::new(256, MemTiming::Bram);
    let mut heap = MainMemory::new(256, MemTiming::Bram);
    let mut method_cache = MethodCache::new(16, 64);
    let mut object_cache = ObjectCache::new(16);
    let mut array_cache = ArrayCache::new(16);
    let mut handles = HandleTable::new(16);
    let mut gc = Collector::new(256, 8, 4, 0.25);
    let mut jbc = vec![0u8; 16];
    let mut ctrl = MemController::new();

    ctrl.submit(MemRequest::RawWrite { addr: 1, value: 5 }, &object_cache, &array_cache);
    let completion = ctrl.step(
        false,
        &mut mem,
        &mut heap,
        &mut method_cache,
        &mut object_cache,
        &mut array_cache,
        &mut handles,
        &mut gc,
        &mut jbc,
    );
    assert!(completion.result.is_none());
    assert!(ctrl.is_busy());
    assert_eq!(mem.read(1), 0);
}

#[test]
fn getfield_cache_hit_resolves_without_entering_busy_states() {
    let mut object_cache = ObjectCache::new(4);
    object_cache.fill(8, 2, 0x12345678);
    let mut ctrl = MemController::new();

    let completion = ctrl.submit(MemRequest::GetField { handle: 8, field: 2 }, &object_cache, &ArrayCache::new(1));
    assert_eq!(completion.unwrap().result, Some(0x12345678));
    assert!(!ctrl.is_busy());
}
