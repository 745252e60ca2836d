/*!
 * Arena Serializer
 * Pool-backed front end: lease an arena, encode into it, hand back the bytes
 *
 * # Example
 *
 * ```
 * use catena::serialization::ArenaSerializer;
 * use serde::{Deserialize, Serialize};
 *
 * #[derive(Serialize, Deserialize)]
 * struct User {
 *     name: String,
 * }
 *
 * let serializer = ArenaSerializer::new(1024 * 1024).unwrap();
 * let payload = serializer
 *     .serialize_to_json(&User { name: "Alice".into() })
 *     .unwrap();
 * assert_eq!(&payload[..], br#"{"name":"Alice"}"#);
 * // Arena is reset and returned to the pool when `payload` drops
 * ```
 */

use super::{
    BincodeCodec, Decoder, Encoder, Format, JsonCodec, ProtoCodec, SerializationResult,
};
use crate::core::errors::ConfigResult;
use crate::memory::{Allocation, ArenaLease, ArenaPool, PoolConfig};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::ops::Deref;
use tracing::trace;

/// Serializer that reuses pooled arenas as output buffers
#[derive(Debug)]
pub struct ArenaSerializer {
    pool: ArenaPool,
}

impl ArenaSerializer {
    /// Serializer over a fixed-policy pool of `arena_capacity`-byte arenas
    pub fn new(arena_capacity: usize) -> ConfigResult<Self> {
        Ok(Self::with_pool(ArenaPool::with_capacity(arena_capacity)?))
    }

    pub fn with_config(config: PoolConfig) -> ConfigResult<Self> {
        Ok(Self::with_pool(ArenaPool::new(config)?))
    }

    pub fn with_pool(pool: ArenaPool) -> Self {
        Self { pool }
    }

    /// Serializer configured from `CATENA_*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::with_config(PoolConfig::from_env()?)
    }

    #[inline]
    pub fn pool(&self) -> &ArenaPool {
        &self.pool
    }

    /// Encode `value` into a leased arena
    ///
    /// The returned payload holds the lease; dropping it resets the arena and
    /// returns it to the pool.
    pub fn serialize<T, C>(&self, codec: &C, value: &T) -> SerializationResult<Serialized<'_>>
    where
        T: ?Sized,
        C: Encoder<T>,
    {
        let mut lease = self.pool.lease();
        let allocation = codec.encode_into(value, &mut lease)?;
        trace!(
            format = %codec.format(),
            bytes = allocation.len(),
            arena = %lease.id(),
            "Serialized payload into arena"
        );

        Ok(Serialized {
            lease,
            allocation,
            format: codec.format(),
        })
    }

    /// Decode `bytes`, lending the codec a leased arena for scratch space
    pub fn deserialize<T, C>(&self, codec: &C, bytes: &[u8]) -> SerializationResult<T>
    where
        C: Decoder<T>,
    {
        let mut lease = self.pool.lease();
        codec.decode_with_scratch(bytes, &mut lease)
    }

    // ========================================================================
    // Format Shorthands
    // ========================================================================

    pub fn serialize_to_json<T>(&self, value: &T) -> SerializationResult<Serialized<'_>>
    where
        T: Serialize + ?Sized,
    {
        self.serialize(&JsonCodec, value)
    }

    pub fn deserialize_from_json<T>(&self, bytes: &[u8]) -> SerializationResult<T>
    where
        T: DeserializeOwned,
    {
        self.deserialize(&JsonCodec, bytes)
    }

    pub fn serialize_to_proto<M>(&self, message: &M) -> SerializationResult<Serialized<'_>>
    where
        M: prost::Message,
    {
        self.serialize(&ProtoCodec, message)
    }

    pub fn deserialize_from_proto<M>(&self, bytes: &[u8]) -> SerializationResult<M>
    where
        M: prost::Message + Default,
    {
        self.deserialize(&ProtoCodec, bytes)
    }

    pub fn serialize_to_bincode<T>(&self, value: &T) -> SerializationResult<Serialized<'_>>
    where
        T: Serialize + ?Sized,
    {
        self.serialize(&BincodeCodec, value)
    }

    pub fn deserialize_from_bincode<T>(&self, bytes: &[u8]) -> SerializationResult<T>
    where
        T: DeserializeOwned,
    {
        self.deserialize(&BincodeCodec, bytes)
    }
}

// ============================================================================
// Serialized Payload
// ============================================================================

/// Encoded bytes living in a leased arena
///
/// Dereferences to `[u8]`. Use [`to_bytes`](Serialized::to_bytes) to keep the
/// payload past the lease.
pub struct Serialized<'p> {
    lease: ArenaLease<'p>,
    allocation: Allocation,
    format: Format,
}

impl<'p> Serialized<'p> {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.lease.region(&self.allocation)
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Handle to the payload inside the lease
    #[inline]
    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    /// Copy the payload out so the arena can be returned
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }

    /// Keep the lease for further allocations after the payload
    ///
    /// The payload stays reachable through [`Self::allocation`] until the arena resets.
    pub fn into_lease(self) -> ArenaLease<'p> {
        self.lease
    }
}

impl Deref for Serialized<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Serialized<'_> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Serialized<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serialized")
            .field("format", &self.format)
            .field("len", &self.allocation.len())
            .field("arena", &self.lease.id())
            .finish()
    }
}
