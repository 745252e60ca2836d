/*!
 * Memory Types
 * Identifiers, allocation handles and errors shared by arenas and the arena pool
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Arena operation result
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

// ============================================================================
// Identifiers
// ============================================================================

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique arena identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub u64);

impl ArenaId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arena-{}", self.0)
    }
}

/// Process-unique pool identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl PoolId {
    pub(crate) fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

// ============================================================================
// Exhaustion Policy
// ============================================================================

/// What an arena does when a request does not fit in the remaining space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Report [`ArenaError::Exhausted`] and leave the arena untouched
    #[default]
    Fixed,
    /// Replace the buffer with one of `max(capacity * 2, cursor + size)` bytes
    Growable,
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionPolicy::Fixed => write!(f, "fixed"),
            ExhaustionPolicy::Growable => write!(f, "growable"),
        }
    }
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(ExhaustionPolicy::Fixed),
            "growable" | "grow" => Ok(ExhaustionPolicy::Growable),
            other => Err(format!("unknown exhaustion policy '{}'", other)),
        }
    }
}

// ============================================================================
// Allocation Handles
// ============================================================================

/// Offset handle to a region reserved in an arena
///
/// Unlike the `&mut [u8]` returned by [`Arena::allocate`](super::Arena::allocate),
/// a handle does not borrow the arena, so several regions of the same lease can be
/// held at once. The handle remembers the arena, the reset epoch and the rollback
/// generation it was issued in; resolving it after a reset, after a rollback below
/// its end, or against another arena fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub(crate) arena: ArenaId,
    pub(crate) epoch: u64,
    pub(crate) generation: u64,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl Allocation {
    /// Arena that issued this region
    #[inline]
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Byte offset of the region inside the arena buffer
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Region length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte of the region
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Cursor mark that an arena can be rolled back to within the same epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub(crate) arena: ArenaId,
    pub(crate) epoch: u64,
    pub(crate) cursor: usize,
}

impl Checkpoint {
    /// Cursor position captured by this checkpoint
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-arena usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaStats {
    pub capacity: usize,
    pub used: usize,
    pub remaining: usize,
    /// Highest cursor value observed since construction
    pub high_water_mark: usize,
    /// Number of buffer replacements under the growable policy
    pub grow_count: u32,
    pub resets: u64,
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Arenas constructed from the template
    pub created: u64,
    /// Leases served from the idle queue
    pub hits: u64,
    /// Leases that had to construct a new arena
    pub misses: u64,
    /// Arenas reset and returned to the idle queue
    pub released: u64,
    /// Arenas dropped on return (idle queue full or capacity over retention limit)
    pub discarded: u64,
    /// Arenas permanently taken out of the pool through `detach`
    pub detached: u64,
    /// Leases currently held by callers
    pub outstanding: u64,
    /// Arenas waiting in the idle queue
    pub idle: usize,
}

impl PoolStats {
    /// Fraction of leases served without constructing an arena
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Arena errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ArenaError {
    #[error("Arena exhausted: requested {requested} bytes, available {available} bytes")]
    #[diagnostic(
        code(arena::exhausted),
        help("Retry with a larger arena, switch to the growable policy, or reject the payload.")
    )]
    Exhausted { requested: usize, available: usize },

    #[error("Stale allocation: issued in epoch {issued}, arena is at epoch {current}")]
    #[diagnostic(
        code(arena::stale_allocation),
        help("The arena was reset after this region was reserved; its bytes may have been reused.")
    )]
    StaleAllocation { issued: u64, current: u64 },

    #[error("Allocation belongs to {owner}, not {arena}")]
    #[diagnostic(
        code(arena::foreign_allocation),
        help("Resolve allocation handles only against the arena that issued them.")
    )]
    ForeignAllocation { owner: ArenaId, arena: ArenaId },

    #[error("Allocation ending at {end} was rolled back, cursor is at {cursor}")]
    #[diagnostic(code(arena::rolled_back))]
    RolledBack { end: usize, cursor: usize },

    #[error("Invalid checkpoint: {0}")]
    #[diagnostic(
        code(arena::invalid_checkpoint),
        help("Checkpoints are only valid for the same arena and epoch, and cannot move the cursor forward.")
    )]
    InvalidCheckpoint(String),
}

/// Arena pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PoolError {
    #[error("Lease from {lease_pool} cannot be released into {pool}")]
    #[diagnostic(
        code(pool::foreign_lease),
        help("Release a lease into the pool it was obtained from. The arena went back to its own pool.")
    )]
    ForeignLease { pool: PoolId, lease_pool: PoolId },
}
