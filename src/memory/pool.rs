/*!
 * Arena Pool
 * Leases arenas to one owner at a time and resets them on return
 *
 * # Performance
 *
 * - **Lease/release**: one lock-free queue operation each
 * - **Allocation on a leased arena**: no synchronization at all
 * - **Miss**: builds a fresh arena from the template config
 *
 * # Example
 *
 * ```
 * use catena::memory::ArenaPool;
 *
 * let pool = ArenaPool::with_capacity(1024).unwrap();
 *
 * let mut lease = pool.lease();
 * lease.allocate(512).unwrap().fill(7);
 * lease.release(); // reset + back to the idle queue
 *
 * let lease = pool.lease();
 * assert_eq!(lease.used(), 0);
 * ```
 */

use super::arena::Arena;
use super::config::PoolConfig;
use super::types::{PoolError, PoolId, PoolResult, PoolStats};
use crate::core::errors::ConfigResult;
use crossbeam_queue::ArrayQueue;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Pool of reusable arenas
///
/// Construct one explicitly and pass it to whoever needs scratch space; there is
/// no process-wide instance. The pool is `Sync`, so it can be shared by
/// reference or behind an `Arc` across threads.
pub struct ArenaPool {
    id: PoolId,
    config: PoolConfig,
    idle: ArrayQueue<Arena>,
    counters: PoolCounters,
}

#[derive(Default)]
struct PoolCounters {
    created: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
    detached: AtomicU64,
    outstanding: AtomicU64,
}

impl ArenaPool {
    /// Create a pool; no arenas are built until the first lease or [`prewarm`](Self::prewarm)
    pub fn new(config: PoolConfig) -> ConfigResult<Self> {
        config.validate()?;

        debug!(
            template_capacity = config.arena.capacity,
            policy = %config.arena.policy,
            max_idle = config.max_idle,
            "Created arena pool"
        );

        Ok(Self {
            id: PoolId::next(),
            idle: ArrayQueue::new(config.max_idle),
            config,
            counters: PoolCounters::default(),
        })
    }

    /// Fixed-policy pool with default retention limits
    pub fn with_capacity(template_capacity: usize) -> ConfigResult<Self> {
        Self::new(PoolConfig::with_capacity(template_capacity))
    }

    /// Take an idle arena, or build one from the template on a miss
    pub fn lease(&self) -> ArenaLease<'_> {
        let arena = match self.idle.pop() {
            Some(arena) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                arena
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.counters.created.fetch_add(1, Ordering::Relaxed);
                let arena = Arena::from_validated(&self.config.arena);
                debug!(
                    pool = %self.id,
                    arena = %arena.id(),
                    capacity = arena.capacity(),
                    "Pool miss, built new arena"
                );
                arena
            }
        };

        self.counters.outstanding.fetch_add(1, Ordering::Relaxed);
        trace!(pool = %self.id, arena = %arena.id(), "Leased arena");

        ArenaLease {
            pool: self,
            arena: Some(arena),
        }
    }

    /// Return a lease to this pool
    ///
    /// A lease taken from a different pool is rejected; its arena still goes back
    /// to the pool it came from.
    pub fn release(&self, lease: ArenaLease<'_>) -> PoolResult<()> {
        if lease.pool.id != self.id {
            let err = PoolError::ForeignLease {
                pool: self.id,
                lease_pool: lease.pool.id,
            };
            drop(lease);
            return Err(err);
        }
        lease.release();
        Ok(())
    }

    /// Reset an arena and put it back in the idle queue, or drop it
    fn reclaim(&self, mut arena: Arena) {
        self.counters.outstanding.fetch_sub(1, Ordering::Relaxed);
        arena.reset();

        if arena.capacity() > self.config.max_retained_capacity {
            self.counters.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(
                pool = %self.id,
                arena = %arena.id(),
                capacity = arena.capacity(),
                limit = self.config.max_retained_capacity,
                "Dropped oversized arena on release"
            );
            return;
        }

        let arena_id = arena.id();
        match self.idle.push(arena) {
            Ok(()) => {
                self.counters.released.fetch_add(1, Ordering::Relaxed);
                trace!(pool = %self.id, arena = %arena_id, "Released arena");
            }
            Err(_arena) => {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                debug!(pool = %self.id, arena = %arena_id, "Idle queue full, dropped arena");
            }
        }
    }

    /// Build up to `count` idle arenas ahead of time, returning how many were added
    pub fn prewarm(&self, count: usize) -> usize {
        let mut added = 0;
        for _ in 0..count {
            if self.idle.is_full() {
                break;
            }
            let arena = Arena::from_validated(&self.config.arena);
            if self.idle.push(arena).is_err() {
                break;
            }
            self.counters.created.fetch_add(1, Ordering::Relaxed);
            added += 1;
        }
        debug!(pool = %self.id, added, "Prewarmed arena pool");
        added
    }

    /// Drop every idle arena, returning how many were freed
    ///
    /// Leases still outstanding are unaffected and return normally.
    pub fn drain(&self) -> usize {
        let mut freed = 0;
        while self.idle.pop().is_some() {
            freed += 1;
        }
        debug!(pool = %self.id, freed, "Drained arena pool");
        freed
    }

    #[inline]
    pub fn id(&self) -> PoolId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[inline]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.counters.created.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            released: self.counters.released.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            detached: self.counters.detached.load(Ordering::Relaxed),
            outstanding: self.counters.outstanding.load(Ordering::Relaxed),
            idle: self.idle.len(),
        }
    }
}

impl fmt::Debug for ArenaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaPool")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("idle", &self.idle.len())
            .finish()
    }
}

// ============================================================================
// Lease Handle
// ============================================================================

/// Exclusive, move-only access to a pooled arena
///
/// Dereferences to [`Arena`]. Dropping the lease or calling
/// [`release`](ArenaLease::release) resets the arena and hands it back to the
/// pool; either way the handle is consumed, so it cannot be returned twice.
#[must_use = "dropping a lease immediately returns its arena to the pool"]
pub struct ArenaLease<'p> {
    pool: &'p ArenaPool,
    // Some until the arena is handed back or detached
    arena: Option<Arena>,
}

impl<'p> ArenaLease<'p> {
    /// Return the arena to its pool
    #[inline]
    pub fn release(mut self) {
        if let Some(arena) = self.arena.take() {
            self.pool.reclaim(arena);
        }
    }

    /// Take the arena out of pool control for good
    ///
    /// The pool simply builds a replacement on a later miss.
    pub fn detach(mut self) -> Arena {
        match self.arena.take() {
            Some(arena) => {
                self.pool.counters.outstanding.fetch_sub(1, Ordering::Relaxed);
                self.pool.counters.detached.fetch_add(1, Ordering::Relaxed);
                debug!(pool = %self.pool.id, arena = %arena.id(), "Detached arena from pool");
                arena
            }
            None => unreachable!("arena lease used after return"),
        }
    }

    /// Pool this lease must be returned to
    #[inline]
    pub fn pool_id(&self) -> PoolId {
        self.pool.id
    }
}

impl Deref for ArenaLease<'_> {
    type Target = Arena;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        match &self.arena {
            Some(arena) => arena,
            None => unreachable!("arena lease used after return"),
        }
    }
}

impl DerefMut for ArenaLease<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.arena {
            Some(arena) => arena,
            None => unreachable!("arena lease used after return"),
        }
    }
}

impl Drop for ArenaLease<'_> {
    fn drop(&mut self) {
        if let Some(arena) = self.arena.take() {
            self.pool.reclaim(arena);
        }
    }
}

impl fmt::Debug for ArenaLease<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaLease")
            .field("pool", &self.pool.id)
            .field("arena", &self.arena)
            .finish()
    }
}
