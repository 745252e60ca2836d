/*!
 * Arena Pool Tests
 * Lease discipline, reset-on-release and concurrent leasing
 */

use catena::memory::{ArenaConfig, ArenaId, ArenaPool, PoolConfig, PoolError};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};

#[test]
fn test_pool_scenario() {
    let pool = ArenaPool::with_capacity(1024).unwrap();

    let a1 = pool.lease();
    let a2 = pool.lease();
    assert_ne!(a1.id(), a2.id());

    pool.release(a1).unwrap();
    pool.release(a2).unwrap();

    let mut a3 = pool.lease();
    let mut a4 = pool.lease();
    assert_ne!(a3.id(), a4.id());
    assert_eq!(a3.allocate(512).unwrap().len(), 512);
    assert_eq!(a4.allocate(512).unwrap().len(), 512);
}

#[test]
fn test_released_arena_comes_back_empty() {
    let pool = ArenaPool::with_capacity(256).unwrap();

    let mut lease = pool.lease();
    let id = lease.id();
    lease.write_bytes(b"previous request").unwrap();
    pool.release(lease).unwrap();

    let lease = pool.lease();
    assert_eq!(lease.id(), id);
    assert_eq!(lease.used(), 0);
    assert_eq!(lease.remaining(), 256);
}

#[test]
fn test_concurrent_leases_are_distinct() {
    const THREADS: usize = 16;

    let pool = ArenaPool::new(PoolConfig::with_capacity(128).with_max_idle(THREADS)).unwrap();
    pool.prewarm(THREADS / 2);
    let barrier = Barrier::new(THREADS);

    let ids: Vec<ArenaId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let mut lease = pool.lease();
                    lease.allocate(64).unwrap();
                    let id = lease.id();
                    // Hold every lease at once before anyone releases
                    barrier.wait();
                    id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), THREADS);

    let stats = pool.stats();
    assert_eq!(stats.outstanding, 0);
    assert_eq!(stats.hits + stats.misses, THREADS as u64);
}

#[test]
fn test_shared_pool_across_threads_with_arc() {
    let pool = Arc::new(ArenaPool::with_capacity(512).unwrap());

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                for round in 0..100u32 {
                    let mut lease = pool.lease();
                    assert_eq!(lease.used(), 0);
                    let region = lease.allocate(256).unwrap();
                    region.fill((i as u32 + round) as u8);
                    assert!(region.iter().all(|&b| b == (i as u32 + round) as u8));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.outstanding, 0);
    assert!(stats.created <= 4);
}

#[test]
fn test_release_into_wrong_pool() {
    let a = ArenaPool::with_capacity(64).unwrap();
    let b = ArenaPool::with_capacity(64).unwrap();

    let lease = a.lease();
    assert!(matches!(b.release(lease), Err(PoolError::ForeignLease { .. })));
    assert_eq!(a.stats().outstanding, 0);
    assert_eq!(a.idle_count(), 1);
}

#[test]
fn test_growable_template_and_retention() {
    let config = PoolConfig::default()
        .with_arena(ArenaConfig::with_capacity(128).growable())
        .with_max_retained_capacity(1024);
    let pool = ArenaPool::new(config).unwrap();

    // Grows but stays under the retention limit: kept
    let mut lease = pool.lease();
    lease.allocate(600).unwrap();
    lease.release();
    assert_eq!(pool.idle_count(), 1);

    // Same arena, grown capacity survives the reset
    let mut lease = pool.lease();
    assert!(lease.capacity() >= 600);
    lease.allocate(4096).unwrap();
    lease.release();
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.stats().discarded, 1);
}
