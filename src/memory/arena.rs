/*!
 * Bump Arena
 * Contiguous scratch buffer carved into byte ranges by an advancing cursor
 *
 * # Performance
 *
 * - **Allocation**: O(1), bounds check plus cursor bump
 * - **Reset**: O(1), cursor rewinds, buffer is kept and not zeroed
 * - **Growth** (growable policy only): one copy of the used prefix
 *
 * # Example
 *
 * ```
 * use catena::memory::Arena;
 *
 * let mut arena = Arena::new(1024);
 * let region = arena.allocate(5).unwrap();
 * region.copy_from_slice(b"hello");
 * assert_eq!(arena.remaining(), 1019);
 *
 * arena.reset();
 * assert_eq!(arena.used(), 0);
 * ```
 */

use super::config::ArenaConfig;
use super::types::{
    Allocation, ArenaError, ArenaId, ArenaResult, ArenaStats, Checkpoint, ExhaustionPolicy,
};
use crate::core::errors::ConfigResult;
use crate::core::limits::{ARENA_GROWTH_FACTOR, MAX_ARENA_CAPACITY};
use std::fmt;
use tracing::debug;

/// Single-owner bump arena over one contiguous byte buffer
///
/// `buffer.len()` is the capacity; `[0, cursor)` is handed out, `[cursor, capacity)`
/// is free. Allocation needs `&mut self`, so a slice returned by [`Arena::allocate`]
/// can never outlive a [`Arena::reset`] or a buffer replacement.
pub struct Arena {
    id: ArenaId,
    buffer: Vec<u8>,
    cursor: usize,
    policy: ExhaustionPolicy,
    max_capacity: usize,
    epoch: u64,
    /// Rollbacks in the current epoch
    generation: u64,
    /// `(generation, cursor)` after each rollback this epoch, cursors strictly increasing
    rollback_floors: Vec<(u64, usize)>,
    high_water_mark: usize,
    grow_count: u32,
}

impl Arena {
    /// Fixed-capacity arena
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, ExhaustionPolicy::Fixed, MAX_ARENA_CAPACITY)
    }

    /// Arena that replaces its buffer with a larger one when exhausted
    pub fn growable(capacity: usize) -> Self {
        Self::build(capacity, ExhaustionPolicy::Growable, MAX_ARENA_CAPACITY)
    }

    /// Arena from a validated config
    pub fn with_config(config: &ArenaConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: &ArenaConfig) -> Self {
        Self::build(config.capacity, config.policy, config.max_capacity)
    }

    fn build(capacity: usize, policy: ExhaustionPolicy, max_capacity: usize) -> Self {
        Self {
            id: ArenaId::next(),
            buffer: vec![0u8; capacity],
            cursor: 0,
            policy,
            max_capacity: max_capacity.max(capacity),
            epoch: 0,
            generation: 0,
            rollback_floors: Vec::new(),
            high_water_mark: 0,
            grow_count: 0,
        }
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Reserve `size` bytes and return them as a writable slice
    ///
    /// The slice starts at the previous cursor. On error the arena is unchanged.
    #[inline]
    pub fn allocate(&mut self, size: usize) -> ArenaResult<&mut [u8]> {
        let allocation = self.reserve(size)?;
        Ok(&mut self.buffer[allocation.offset..allocation.end()])
    }

    /// Reserve `size` bytes and return an offset handle to them
    pub fn reserve(&mut self, size: usize) -> ArenaResult<Allocation> {
        let end = self.fit(size)?;
        let offset = self.cursor;
        self.cursor = end;
        if end > self.high_water_mark {
            self.high_water_mark = end;
        }

        Ok(Allocation {
            arena: self.id,
            epoch: self.epoch,
            generation: self.generation,
            offset,
            len: size,
        })
    }

    /// Reserve `data.len()` bytes and copy `data` into them
    pub fn write_bytes(&mut self, data: &[u8]) -> ArenaResult<Allocation> {
        let allocation = self.reserve(data.len())?;
        self.buffer[allocation.offset..allocation.end()].copy_from_slice(data);
        Ok(allocation)
    }

    /// Cursor position after a successful reservation of `size` bytes
    ///
    /// Grows the buffer first when the policy allows it.
    fn fit(&mut self, size: usize) -> ArenaResult<usize> {
        let end = self
            .cursor
            .checked_add(size)
            .ok_or_else(|| self.exhausted(size))?;

        if end <= self.buffer.len() {
            return Ok(end);
        }

        match self.policy {
            ExhaustionPolicy::Fixed => Err(self.exhausted(size)),
            ExhaustionPolicy::Growable => {
                self.grow(end, size)?;
                Ok(end)
            }
        }
    }

    /// Swap in a buffer of `max(capacity * 2, required)` bytes, keeping `[0, cursor)`
    fn grow(&mut self, required: usize, requested: usize) -> ArenaResult<()> {
        if required > self.max_capacity {
            return Err(self.exhausted(requested));
        }

        let doubled = self
            .capacity()
            .checked_mul(ARENA_GROWTH_FACTOR)
            .ok_or_else(|| self.exhausted(requested))?;
        let new_capacity = doubled.max(required).min(self.max_capacity);

        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(new_capacity).is_err() {
            debug!(
                arena = %self.id,
                new_capacity,
                "Allocator refused arena growth"
            );
            return Err(self.exhausted(requested));
        }
        buffer.extend_from_slice(&self.buffer[..self.cursor]);
        buffer.resize(new_capacity, 0);

        debug!(
            arena = %self.id,
            old_capacity = self.capacity(),
            new_capacity,
            cursor = self.cursor,
            requested,
            "Grew arena buffer"
        );

        self.buffer = buffer;
        self.grow_count += 1;
        Ok(())
    }

    #[inline]
    fn exhausted(&self, requested: usize) -> ArenaError {
        ArenaError::Exhausted {
            requested,
            available: self.remaining(),
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Bytes of a region reserved in the current epoch
    pub fn get(&self, allocation: &Allocation) -> ArenaResult<&[u8]> {
        self.check(allocation)?;
        Ok(self.region(allocation))
    }

    /// Writable bytes of a region reserved in the current epoch
    pub fn get_mut(&mut self, allocation: &Allocation) -> ArenaResult<&mut [u8]> {
        self.check(allocation)?;
        Ok(&mut self.buffer[allocation.offset..allocation.end()])
    }

    /// Everything handed out since the last reset, `[0, cursor)`
    #[inline]
    pub fn used_bytes(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }

    /// Region lookup for handles this crate issued and still holds exclusively
    #[inline]
    pub(crate) fn region(&self, allocation: &Allocation) -> &[u8] {
        &self.buffer[allocation.offset..allocation.end()]
    }

    fn check(&self, allocation: &Allocation) -> ArenaResult<()> {
        if allocation.arena != self.id {
            return Err(ArenaError::ForeignAllocation {
                owner: allocation.arena,
                arena: self.id,
            });
        }
        if allocation.epoch != self.epoch {
            return Err(ArenaError::StaleAllocation {
                issued: allocation.epoch,
                current: self.epoch,
            });
        }
        if allocation.end() > self.cursor {
            return Err(ArenaError::RolledBack {
                end: allocation.end(),
                cursor: self.cursor,
            });
        }
        if let Some(floor) = self.rollback_floor(allocation.generation) {
            if allocation.end() > floor {
                return Err(ArenaError::RolledBack {
                    end: allocation.end(),
                    cursor: floor,
                });
            }
        }
        Ok(())
    }

    /// Lowest cursor rolled back to after `generation` was current
    fn rollback_floor(&self, generation: u64) -> Option<usize> {
        let first_later = self
            .rollback_floors
            .partition_point(|&(g, _)| g <= generation);
        self.rollback_floors.get(first_later).map(|&(_, cursor)| cursor)
    }

    // ========================================================================
    // Reclaim
    // ========================================================================

    /// Rewind the cursor to 0 and invalidate every outstanding [`Allocation`]
    ///
    /// Buffer contents are left as they are.
    #[inline]
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.epoch = self.epoch.wrapping_add(1);
        self.generation = 0;
        self.rollback_floors.clear();
    }

    /// Mark the current cursor
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            arena: self.id,
            epoch: self.epoch,
            cursor: self.cursor,
        }
    }

    /// Discard everything reserved after `checkpoint`
    ///
    /// Handles that reach past the checkpoint stay invalid even once the range is
    /// reserved again.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> ArenaResult<()> {
        if checkpoint.arena != self.id {
            return Err(ArenaError::InvalidCheckpoint(format!(
                "taken on {}, applied to {}",
                checkpoint.arena, self.id
            )));
        }
        if checkpoint.epoch != self.epoch {
            return Err(ArenaError::InvalidCheckpoint(format!(
                "taken in epoch {}, arena is at epoch {}",
                checkpoint.epoch, self.epoch
            )));
        }
        if checkpoint.cursor > self.cursor {
            return Err(ArenaError::InvalidCheckpoint(format!(
                "cursor {} is ahead of current cursor {}",
                checkpoint.cursor, self.cursor
            )));
        }
        self.cursor = checkpoint.cursor;
        self.generation += 1;
        while let Some(&(_, floor)) = self.rollback_floors.last() {
            if floor < checkpoint.cursor {
                break;
            }
            self.rollback_floors.pop();
        }
        self.rollback_floors.push((self.generation, checkpoint.cursor));
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    #[inline]
    pub fn id(&self) -> ArenaId {
        self.id
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes handed out since the last reset
    #[inline]
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Bytes left before the exhaustion policy applies
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    #[inline]
    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Number of resets so far
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity(),
            used: self.cursor,
            remaining: self.remaining(),
            high_water_mark: self.high_water_mark,
            grow_count: self.grow_count,
            resets: self.epoch,
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor)
            .field("policy", &self.policy)
            .field("epoch", &self.epoch)
            .finish()
    }
}
