/*!
 * Catena
 * Pooled bump arenas used as scratch buffers for serialized payloads
 *
 * - [`memory`]: the [`Arena`] bump allocator and the [`ArenaPool`] that leases it
 * - [`serialization`]: JSON, Protobuf and bincode codecs writing into arena ranges
 * - [`monitoring`]: tracing subscriber setup
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod serialization;

// Re-exports
pub use crate::core::errors::{CatenaError, ConfigError, Result, SerializableError};
pub use memory::{
    Allocation, Arena, ArenaConfig, ArenaError, ArenaLease, ArenaPool, ExhaustionPolicy,
    PoolConfig, PoolError, PoolStats,
};
pub use monitoring::init_tracing;
pub use serialization::{
    deserialize_object, serialize_object, ArenaSerializer, BincodeCodec, Format, JsonCodec,
    ProtoCodec, SerializationError, Serialized,
};
