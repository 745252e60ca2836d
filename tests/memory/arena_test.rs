/*!
 * Arena Tests
 * Bump allocation, exhaustion policies, reset and handle validation
 */

use catena::memory::{Arena, ArenaConfig, ArenaError, ExhaustionPolicy};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_fixed_arena_scenario() {
    let mut arena = Arena::new(1024);

    let region = arena.allocate(512).unwrap();
    assert_eq!(region.len(), 512);
    assert_eq!(arena.remaining(), 512);

    match arena.allocate(600) {
        Err(ArenaError::Exhausted {
            requested,
            available,
        }) => {
            assert_eq!(requested, 600);
            assert_eq!(available, 512);
        }
        other => panic!("expected exhaustion, got {:?}", other.map(|r| r.len())),
    }

    arena.reset();
    assert_eq!(arena.allocate(1024).unwrap().len(), 1024);
}

#[test]
fn test_fresh_fixed_arena_rejects_capacity_plus_one() {
    let mut arena = Arena::new(256);
    assert!(matches!(
        arena.allocate(257),
        Err(ArenaError::Exhausted {
            requested: 257,
            available: 256
        })
    ));
    assert_eq!(arena.used(), 0);
}

#[test]
fn test_growable_arena_accepts_capacity_plus_one() {
    let mut arena = Arena::growable(256);
    arena.allocate(100).unwrap().fill(0x5A);

    arena.allocate(257).unwrap();
    assert!(arena.capacity() >= 257);
    assert!(arena.used_bytes()[..100].iter().all(|&b| b == 0x5A));
}

#[test]
fn test_config_constructed_arena() {
    let config = ArenaConfig::with_capacity(64).with_policy(ExhaustionPolicy::Growable);
    let arena = Arena::with_config(&config).unwrap();
    assert_eq!(arena.capacity(), 64);
    assert_eq!(arena.policy(), ExhaustionPolicy::Growable);

    assert!(Arena::with_config(&ArenaConfig::with_capacity(0)).is_err());
}

#[test]
fn test_multiple_handles_in_one_lease_period() {
    let mut arena = Arena::new(128);
    let header = arena.reserve(4).unwrap();
    let body = arena.write_bytes(b"body bytes").unwrap();

    // Fill the header after the body is written
    arena
        .get_mut(&header)
        .unwrap()
        .copy_from_slice(&(body.len() as u32).to_le_bytes());

    assert_eq!(arena.used_bytes(), b"\x0a\x00\x00\x00body bytes");
}

#[test]
fn test_reset_invalidates_handles() {
    let mut arena = Arena::new(32);
    let handle = arena.write_bytes(b"first").unwrap();
    arena.reset();
    arena.write_bytes(b"again").unwrap();

    assert!(matches!(
        arena.get(&handle),
        Err(ArenaError::StaleAllocation { .. })
    ));
}

proptest! {
    #[test]
    fn prop_allocations_are_contiguous_and_disjoint(
        sizes in proptest::collection::vec(0usize..64, 0..32)
    ) {
        let mut arena = Arena::new(4096);
        let mut expected_offset = 0;

        for size in sizes {
            let before = arena.remaining();
            let allocation = arena.reserve(size).unwrap();
            prop_assert_eq!(allocation.offset(), expected_offset);
            prop_assert_eq!(allocation.len(), size);
            prop_assert_eq!(arena.remaining(), before - size);
            expected_offset += size;
        }
        prop_assert_eq!(arena.used(), expected_offset);
    }

    #[test]
    fn prop_failed_allocation_changes_nothing(
        capacity in 1usize..512,
        used in 0usize..512,
        extra in 1usize..512,
    ) {
        let used = used.min(capacity);
        let mut arena = Arena::new(capacity);
        arena.allocate(used).unwrap();

        let request = capacity - used + extra;
        let err = arena.allocate(request).unwrap_err();
        prop_assert_eq!(err, ArenaError::Exhausted { requested: request, available: capacity - used });
        prop_assert_eq!(arena.used(), used);
        prop_assert_eq!(arena.capacity(), capacity);
    }

    #[test]
    fn prop_growth_preserves_prefix(
        capacity in 1usize..128,
        prefix in proptest::collection::vec(any::<u8>(), 0..128),
        extra in 1usize..512,
    ) {
        let mut arena = Arena::growable(capacity);
        arena.write_bytes(&prefix).unwrap();
        let before = arena.capacity();

        let request = before - arena.used() + extra;
        arena.allocate(request).unwrap();

        prop_assert!(arena.capacity() >= before + extra);
        prop_assert_eq!(&arena.used_bytes()[..prefix.len()], prefix.as_slice());
    }

    #[test]
    fn prop_reset_then_full_allocation_succeeds(
        capacity in 1usize..1024,
        sizes in proptest::collection::vec(0usize..256, 0..16)
    ) {
        let mut arena = Arena::new(capacity);
        for size in sizes {
            let _ = arena.allocate(size);
        }
        arena.reset();
        prop_assert_eq!(arena.allocate(capacity).unwrap().len(), capacity);
    }
}
