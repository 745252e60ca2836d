/*!
 * JSON Codec
 * serde_json encoding into arena ranges, adaptive SIMD decoding
 *
 * # Features
 * - Thread-local encode buffer, so the payload length is known before the
 *   arena reservation and exhaustion reports the full payload size
 * - One bounds-checked copy from the encode buffer into the reserved range
 * - Payloads above `JSON_SIMD_THRESHOLD` decode in place with simd-json, using
 *   arena scratch instead of a heap copy
 */

use super::{Codec, Decoder, Encoder, Format, SerializationError, SerializationResult};
use crate::core::limits::{JSON_SCRATCH_CAPACITY, JSON_SCRATCH_RETAIN_LIMIT, JSON_SIMD_THRESHOLD};
use crate::memory::{Allocation, Arena};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;

thread_local! {
    /// Encode buffer reused across JSON serializations on this thread
    static ENCODE_BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(JSON_SCRATCH_CAPACITY));
}

/// Borrow the thread-local encode buffer, cleared
///
/// A nested call (a `Serialize` impl that itself serializes JSON) gets a fresh buffer.
fn with_encode_buffer<F, R>(f: F) -> R
where
    F: FnOnce(&mut Vec<u8>) -> R,
{
    ENCODE_BUFFER.with(|cell| match cell.try_borrow_mut() {
        Ok(mut buf) => {
            buf.clear();
            let result = f(&mut buf);
            if buf.capacity() > JSON_SCRATCH_RETAIN_LIMIT {
                *buf = Vec::with_capacity(JSON_SCRATCH_CAPACITY);
            }
            result
        }
        Err(_) => f(&mut Vec::new()),
    })
}

/// JSON codec backed by serde_json and simd-json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    #[inline]
    fn format(&self) -> Format {
        Format::Json
    }
}

impl<T> Encoder<T> for JsonCodec
where
    T: Serialize + ?Sized,
{
    fn encode_into(&self, value: &T, arena: &mut Arena) -> SerializationResult<Allocation> {
        with_encode_buffer(|buf| {
            serde_json::to_writer(&mut *buf, value).map_err(|source| {
                SerializationError::encode(Format::Json, "serde_json serialization", source)
            })?;
            Ok(arena.write_bytes(buf.as_slice())?)
        })
    }
}

impl<T> Decoder<T> for JsonCodec
where
    T: DeserializeOwned,
{
    fn decode(&self, bytes: &[u8]) -> SerializationResult<T> {
        serde_json::from_slice(bytes).map_err(|source| {
            SerializationError::decode(Format::Json, "serde_json deserialization", source)
        })
    }

    fn decode_with_scratch(&self, bytes: &[u8], arena: &mut Arena) -> SerializationResult<T> {
        if bytes.len() <= JSON_SIMD_THRESHOLD {
            return self.decode(bytes);
        }

        let mark = arena.checkpoint();
        let result = match arena.allocate(bytes.len()) {
            Ok(scratch) => {
                // simd-json parses in place and clobbers its input
                scratch.copy_from_slice(bytes);
                simd_json::serde::from_slice::<T>(scratch).map_err(|source| {
                    SerializationError::decode(Format::Json, "simd-json deserialization", source)
                })
            }
            // No room for scratch: the standard parser needs none
            Err(_) => return self.decode(bytes),
        };
        arena.rollback(mark)?;
        result
    }
}
