/*!
 * Memory Module
 * Bump arenas and the arena pool
 *
 * # Performance
 *
 * - Arena: O(1) bump allocation, whole-buffer reset
 * - Pool: reuses arenas across serialize/deserialize cycles, lock-free lease/release
 *
 * # Ownership
 *
 * A pool hands out [`ArenaLease`] handles. A lease is move-only and gives its
 * holder exclusive access to one arena; returning it (explicitly or by drop)
 * resets the arena before it becomes leasable again.
 */

mod arena;
pub mod config;
mod pool;
mod types;

pub use arena::Arena;
pub use config::{ArenaConfig, PoolConfig};
pub use pool::{ArenaLease, ArenaPool};
pub use types::*;
