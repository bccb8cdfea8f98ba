//! Strategies observed through a counting global allocator: every byte reserved is returned,
//! and exhaustion of the backing memory is reported without constructing anything.

#![cfg(not(miri))] // Miri replaces the global allocator, so cannot be used here.

use std::alloc::System;
use std::panic;

use alloc_strategies::{
    Block, Boxed, DynBlock, Error, NoAlloc, RawBytes, Strategy, StrategyKind, ZeroedBytes,
};
use testing::{AllocationCounts, CountingAllocator, Probe, ProbeScope, fail_next_allocation};

#[global_allocator]
static ALLOCATOR: CountingAllocator<System> = CountingAllocator::system();

type Payload = [u64; 3];

/// Runs one full allocation cycle so that one-time setup on the current thread (such as
/// registration of logging call sites) does not show up in the measurements.
fn warm_up<S: Strategy<Val = Payload>>() {
    drop(Block::<S>::new(1));
}

fn returns_every_byte<S: Strategy<Val = Payload>>() {
    warm_up::<S>();

    for n in [1, 2, 100] {
        let before = AllocationCounts::current();

        let ptr = S::alloc(n).unwrap();
        assert!(ptr.is_some());

        // SAFETY: Same strategy, same count, freed once.
        unsafe {
            S::free(ptr, n);
        }

        let delta = AllocationCounts::current().since(&before);
        assert_eq!(delta.allocations, 1, "{} with {n} elements", S::KIND);
        assert_eq!(
            delta.bytes_allocated,
            (n * size_of::<Payload>()) as u64,
            "{} with {n} elements",
            S::KIND
        );
        assert!(delta.is_balanced(), "{} with {n} elements", S::KIND);
    }
}

fn exhaustion_is_reported_as_none<S: Strategy<Val = Probe>>() {
    let scope = ProbeScope::begin();

    fail_next_allocation();
    let result = S::alloc(4);

    assert!(matches!(result, Ok(None)), "{}", S::KIND);
    assert_eq!(scope.constructed(), 0);
}

#[test]
fn allocating_strategies_return_every_byte() {
    returns_every_byte::<Boxed<Payload>>();
    returns_every_byte::<RawBytes<Payload>>();
    returns_every_byte::<ZeroedBytes<Payload>>();
}

#[test]
fn forbidding_strategy_never_touches_the_allocator() {
    warm_up::<NoAlloc<Payload>>();
    let before = AllocationCounts::current();

    for n in [0, 1, 1000] {
        NoAlloc::<Payload>::alloc(n).unwrap_err();
    }

    let delta = AllocationCounts::current().since(&before);
    assert_eq!(delta, AllocationCounts::default());
}

#[test]
fn zero_count_never_touches_the_allocator() {
    warm_up::<RawBytes<Payload>>();
    let before = AllocationCounts::current();

    assert!(Boxed::<Payload>::alloc(0).unwrap().is_none());
    assert!(RawBytes::<Payload>::alloc(0).unwrap().is_none());
    assert!(ZeroedBytes::<Payload>::alloc(0).unwrap().is_none());

    assert_eq!(AllocationCounts::current().since(&before).allocations, 0);
}

#[test]
fn zero_sized_elements_never_touch_the_allocator() {
    #[derive(Default)]
    struct Empty;

    drop(Block::<RawBytes<Empty>>::new(1));
    let before = AllocationCounts::current();

    drop(Block::<Boxed<Empty>>::new(10).unwrap());
    drop(Block::<RawBytes<Empty>>::new(10).unwrap());
    drop(Block::<ZeroedBytes<Empty>>::new(10).unwrap());

    assert_eq!(AllocationCounts::current().since(&before).allocations, 0);
}

#[test]
fn exhaustion_constructs_nothing() {
    exhaustion_is_reported_as_none::<Boxed<Probe>>();
    exhaustion_is_reported_as_none::<RawBytes<Probe>>();
    exhaustion_is_reported_as_none::<ZeroedBytes<Probe>>();
}

#[test]
fn owning_handles_turn_exhaustion_into_error() {
    fail_next_allocation();
    let error = Block::<RawBytes<u64>>::new(8).unwrap_err();
    assert!(matches!(error, Error::AllocationExhausted { count: 8, .. }));

    fail_next_allocation();
    let error = DynBlock::<u64>::new(StrategyKind::ZeroedBytes, 8).unwrap_err();
    assert!(matches!(error, Error::AllocationExhausted { count: 8, .. }));

    // The failure is one-shot; the next attempt succeeds.
    let block = Block::<RawBytes<u64>>::new(8).unwrap();
    assert_eq!(block.len(), 8);
}

#[test]
fn panic_mid_construction_leaks_the_reservation() {
    const COUNT: usize = 4;

    drop(Block::<RawBytes<Probe>>::new(1));

    let scope = ProbeScope::begin();
    scope.panic_on_construction(2);

    let before = AllocationCounts::current();
    let result = panic::catch_unwind(|| RawBytes::<Probe>::alloc(COUNT));
    result.unwrap_err();
    let delta = AllocationCounts::current().since(&before);

    assert_eq!(scope.constructed(), 2);
    assert_eq!(scope.finalized(), 0);

    // Unwinding may allocate on its own, so only the reservation's share is pinned down.
    let outstanding = delta.bytes_allocated.wrapping_sub(delta.bytes_deallocated);
    assert!(delta.allocations >= 1);
    assert!(outstanding >= (COUNT * size_of::<Probe>()) as u64);
}

