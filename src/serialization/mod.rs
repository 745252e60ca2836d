/*!
 * Serialization Utilities
 *
 * Codecs that write their output straight into arena-reserved ranges:
 * - JSON via serde_json, with simd-json for large payloads on the decode side
 * - Protocol Buffers via prost, encoded in place using the exact encoded length
 * - Bincode for compact internal payloads, sized up front and encoded in place
 *
 * The arena only ever sees a byte length to reserve and a range to fill; it does
 * not look at the bytes. A failed encode rolls the arena back to where it was.
 *
 * # Use Cases
 *
 * - **JSON**: external APIs, debugging output
 * - **Protobuf**: cross-language wire messages
 * - **Bincode**: Rust-to-Rust payloads where size and speed matter most
 */

mod binary;
mod json;
mod proto;
mod serializer;

pub use binary::BincodeCodec;
pub use json::JsonCodec;
pub use proto::ProtoCodec;
pub use serializer::{ArenaSerializer, Serialized};

use crate::memory::{Allocation, Arena, ArenaError};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Formats
// ============================================================================

/// Wire format produced by a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Json,
    Protobuf,
    Bincode,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Protobuf => "protobuf",
            Format::Bincode => "bincode",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Result type for codec operations
pub type SerializationResult<T> = Result<T, SerializationError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Codec errors
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum SerializationError {
    #[error("{format} serialization failed: {context}")]
    #[diagnostic(code(serialization::encode))]
    Encode {
        format: Format,
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{format} deserialization failed: {context}")]
    #[diagnostic(
        code(serialization::decode),
        help("The payload is malformed or was produced for a different type.")
    )]
    Decode {
        format: Format,
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Arena rejected payload: {0}")]
    #[diagnostic(transparent)]
    Arena(#[from] ArenaError),
}

impl SerializationError {
    pub(crate) fn encode<E>(format: Format, context: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SerializationError::Encode {
            format,
            context,
            source: Box::new(source),
        }
    }

    pub(crate) fn decode<E>(format: Format, context: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SerializationError::Decode {
            format,
            context,
            source: Box::new(source),
        }
    }

    /// Format involved in the failure, or `"arena"` when space ran out
    pub fn format_name(&self) -> &'static str {
        match self {
            SerializationError::Encode { format, .. } | SerializationError::Decode { format, .. } => {
                format.as_str()
            }
            SerializationError::Arena(_) => "arena",
        }
    }

    /// True when the payload did not fit in the arena
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SerializationError::Arena(ArenaError::Exhausted { .. }))
    }
}

// ============================================================================
// Codec Traits
// ============================================================================

/// Common codec identity
pub trait Codec {
    fn format(&self) -> Format;
}

/// Writes the encoding of `T` into an arena
pub trait Encoder<T: ?Sized>: Codec {
    /// Encode `value` into a freshly reserved arena range
    ///
    /// On error the arena cursor is back where it started.
    fn encode_into(&self, value: &T, arena: &mut Arena) -> SerializationResult<Allocation>;
}

/// Reads `T` back from encoded bytes
pub trait Decoder<T>: Codec {
    fn decode(&self, bytes: &[u8]) -> SerializationResult<T>;

    /// Decode, using `arena` for any temporary copies the codec needs
    ///
    /// Scratch space is rolled back before returning.
    fn decode_with_scratch(&self, bytes: &[u8], _arena: &mut Arena) -> SerializationResult<T> {
        self.decode(bytes)
    }
}

/// Encode `value` with `codec` into `arena` and return the written bytes
pub fn serialize_object<'a, T, C>(
    codec: &C,
    value: &T,
    arena: &'a mut Arena,
) -> SerializationResult<&'a [u8]>
where
    T: ?Sized,
    C: Encoder<T>,
{
    let allocation = codec.encode_into(value, arena)?;
    let arena: &'a Arena = arena;
    Ok(arena.region(&allocation))
}

/// Decode `bytes` into a `T` with `codec`
pub fn deserialize_object<T, C>(codec: &C, bytes: &[u8]) -> SerializationResult<T>
where
    C: Decoder<T>,
{
    codec.decode(bytes)
}
