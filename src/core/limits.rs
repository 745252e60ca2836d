/*!
 * Limits and Defaults
 *
 * Centralized location for arena and pool sizing constants.
 * - Performance-relevant constants are marked with [PERF]
 * - Hard bounds are marked with [BOUND]
 */

// =============================================================================
// ARENA
// =============================================================================

/// Default arena capacity (1MB)
/// Large enough for typical serialized request/response payloads
pub const DEFAULT_ARENA_CAPACITY: usize = 1024 * 1024;

/// Largest buffer an arena may ever hold
/// [BOUND] `Vec<u8>` cannot exceed `isize::MAX` bytes
pub const MAX_ARENA_CAPACITY: usize = isize::MAX as usize;

/// Growth factor applied to capacity when a growable arena is exhausted
pub const ARENA_GROWTH_FACTOR: usize = 2;

// =============================================================================
// POOL
// =============================================================================

/// Maximum idle arenas retained by a pool
/// [PERF] Bounds the memory a pool holds on to between bursts
pub const DEFAULT_MAX_IDLE_ARENAS: usize = 64;

/// Arenas that grew beyond this many bytes are dropped instead of pooled (64MB)
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 64 * 1024 * 1024;

// =============================================================================
// SERIALIZATION
// =============================================================================

/// JSON payloads larger than this are decoded with simd-json (1KB)
/// [PERF] Below this, serde_json wins because SIMD setup dominates
pub const JSON_SIMD_THRESHOLD: usize = 1024;

/// Initial capacity of the thread-local JSON encode buffer (4KB)
pub const JSON_SCRATCH_CAPACITY: usize = 4096;

/// Thread-local JSON scratch buffers that grew past this are released (1MB)
pub const JSON_SCRATCH_RETAIN_LIMIT: usize = 1024 * 1024;
