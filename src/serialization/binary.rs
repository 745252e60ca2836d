/*!
 * Bincode Codec
 * Compact binary encoding sized up front and written in place
 *
 * `bincode::serialized_size` gives the exact length, so the arena reserves once
 * and `serialize_into` fills the range without an intermediate buffer.
 */

use super::{Codec, Decoder, Encoder, Format, SerializationError, SerializationResult};
use crate::memory::{Allocation, Arena, ArenaError};
use serde::{de::DeserializeOwned, Serialize};

/// Bincode codec
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    #[inline]
    fn format(&self) -> Format {
        Format::Bincode
    }
}

impl<T> Encoder<T> for BincodeCodec
where
    T: Serialize + ?Sized,
{
    fn encode_into(&self, value: &T, arena: &mut Arena) -> SerializationResult<Allocation> {
        let size = bincode::serialized_size(value).map_err(|source| {
            SerializationError::encode(Format::Bincode, "size calculation", source)
        })?;
        // A size beyond the address space can never fit
        let size = usize::try_from(size).map_err(|_| ArenaError::Exhausted {
            requested: usize::MAX,
            available: arena.remaining(),
        })?;

        let mark = arena.checkpoint();
        let allocation = arena.reserve(size)?;

        let mut dst: &mut [u8] = arena.get_mut(&allocation)?;
        if let Err(source) = bincode::serialize_into(&mut dst, value) {
            arena.rollback(mark)?;
            return Err(SerializationError::encode(
                Format::Bincode,
                "bincode serialization",
                source,
            ));
        }
        Ok(allocation)
    }
}

impl<T> Decoder<T> for BincodeCodec
where
    T: DeserializeOwned,
{
    fn decode(&self, bytes: &[u8]) -> SerializationResult<T> {
        bincode::deserialize(bytes).map_err(|source| {
            SerializationError::decode(Format::Bincode, "bincode deserialization", source)
        })
    }
}
