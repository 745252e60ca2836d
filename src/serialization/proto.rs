/*!
 * Protocol Buffers Codec
 * prost messages encoded directly into an arena range of their exact encoded length
 */

use super::{Codec, Decoder, Encoder, Format, SerializationError, SerializationResult};
use crate::memory::{Allocation, Arena};
use prost::Message;

/// Protobuf codec backed by prost
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoCodec;

impl Codec for ProtoCodec {
    #[inline]
    fn format(&self) -> Format {
        Format::Protobuf
    }
}

impl<M> Encoder<M> for ProtoCodec
where
    M: Message,
{
    fn encode_into(&self, value: &M, arena: &mut Arena) -> SerializationResult<Allocation> {
        let mark = arena.checkpoint();
        let allocation = arena.reserve(value.encoded_len())?;

        let mut dst: &mut [u8] = arena.get_mut(&allocation)?;
        if let Err(source) = value.encode(&mut dst) {
            arena.rollback(mark)?;
            return Err(SerializationError::encode(
                Format::Protobuf,
                "prost encoding",
                source,
            ));
        }
        Ok(allocation)
    }
}

impl<M> Decoder<M> for ProtoCodec
where
    M: Message + Default,
{
    fn decode(&self, bytes: &[u8]) -> SerializationResult<M> {
        <M as Message>::decode(bytes).map_err(|source| {
            SerializationError::decode(Format::Protobuf, "prost decoding", source)
        })
    }
}
