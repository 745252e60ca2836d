/*!
 * Serializer Tests
 * JSON, Protobuf and bincode payloads through pooled arenas
 */

use catena::memory::{Arena, ExhaustionPolicy, PoolConfig};
use catena::serialization::{
    deserialize_object, serialize_object, ArenaSerializer, BincodeCodec, Format, JsonCodec,
    ProtoCodec, SerializationError,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    email: String,
}

#[derive(Clone, PartialEq, prost::Message)]
struct ProtoUser {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(string, tag = "2")]
    email: String,
}

fn alice() -> User {
    User {
        name: "Alice".into(),
        email: "alice@example.com".into(),
    }
}

fn john() -> ProtoUser {
    ProtoUser {
        name: "John".into(),
        email: "john@mail.com".into(),
    }
}

#[test]
fn test_serialize_to_json_is_valid_json() {
    let serializer = ArenaSerializer::new(1024 * 1024).unwrap();

    let payload = serializer.serialize_to_json(&alice()).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

    assert_eq!(value["name"], "Alice");
    assert_eq!(value["email"], "alice@example.com");
}

#[test]
fn test_json_round_trip() {
    let serializer = ArenaSerializer::new(1024 * 1024).unwrap();

    let payload = serializer.serialize_to_json(&alice()).unwrap();
    let decoded: User = serializer.deserialize_from_json(&payload).unwrap();
    assert_eq!(decoded, alice());
}

#[test]
fn test_large_json_round_trip() {
    let serializer = ArenaSerializer::new(1024 * 1024).unwrap();
    let users: Vec<User> = (0..200)
        .map(|i| User {
            name: format!("user-{i}"),
            email: format!("user-{i}@example.com"),
        })
        .collect();

    let bytes = serializer.serialize_to_json(&users).unwrap().to_bytes();
    assert!(bytes.len() > 1024);

    let decoded: Vec<User> = serializer.deserialize_from_json(&bytes).unwrap();
    assert_eq!(decoded, users);
}

#[test]
fn test_proto_round_trip() {
    let serializer = ArenaSerializer::new(1024 * 1024).unwrap();

    let payload = serializer.serialize_to_proto(&john()).unwrap();
    assert_eq!(payload.format(), Format::Protobuf);

    let decoded: ProtoUser = serializer.deserialize_from_proto(&payload).unwrap();
    assert_eq!(decoded, john());
}

#[test]
fn test_bincode_round_trip() {
    let serializer = ArenaSerializer::new(4096).unwrap();

    let payload = serializer.serialize_to_bincode(&alice()).unwrap();
    let decoded: User = serializer.deserialize_from_bincode(&payload).unwrap();
    assert_eq!(decoded, alice());
}

#[test]
fn test_repeated_cycles_reuse_one_arena() {
    let serializer = ArenaSerializer::new(4096).unwrap();

    for _ in 0..50 {
        let payload = serializer.serialize_to_json(&alice()).unwrap();
        let decoded: User = serializer.deserialize_from_json(&payload).unwrap();
        assert_eq!(decoded.name, "Alice");
    }

    // One arena for the payload, one leased alongside it for decode scratch
    let stats = serializer.pool().stats();
    assert_eq!(stats.created, 2);
    assert_eq!(stats.outstanding, 0);
}

#[test]
fn test_fixed_arena_rejects_oversized_payload() {
    let serializer = ArenaSerializer::new(16).unwrap();

    match serializer.serialize_to_json(&alice()) {
        Err(SerializationError::Arena(catena::ArenaError::Exhausted {
            requested,
            available,
        })) => {
            assert_eq!(requested, serde_json::to_vec(&alice()).unwrap().len());
            assert_eq!(available, 16);
        }
        other => panic!("expected exhaustion, got {:?}", other.map(|p| p.len())),
    };
}

#[test]
fn test_growable_serializer() {
    let serializer = ArenaSerializer::with_config(
        PoolConfig::with_capacity(16).with_policy(ExhaustionPolicy::Growable),
    )
    .unwrap();

    let payload = serializer.serialize_to_proto(&john()).unwrap();
    let decoded: ProtoUser = serializer.deserialize_from_proto(&payload).unwrap();
    assert_eq!(decoded, john());
}

#[test]
fn test_several_payloads_in_one_arena() {
    let mut arena = Arena::new(1024);

    let json = serialize_object(&JsonCodec, &alice(), &mut arena).unwrap().to_vec();
    let proto = serialize_object(&ProtoCodec, &john(), &mut arena).unwrap().to_vec();
    let binary = serialize_object(&BincodeCodec, &alice(), &mut arena).unwrap().to_vec();

    assert_eq!(arena.used(), json.len() + proto.len() + binary.len());

    let from_json: User = deserialize_object(&JsonCodec, &json).unwrap();
    let from_proto: ProtoUser = deserialize_object(&ProtoCodec, &proto).unwrap();
    let from_binary: User = deserialize_object(&BincodeCodec, &binary).unwrap();
    assert_eq!(from_json, alice());
    assert_eq!(from_proto, john());
    assert_eq!(from_binary, alice());
}

#[test]
fn test_malformed_payload_is_decode_error() {
    let serializer = ArenaSerializer::new(1024).unwrap();
    let result: Result<User, _> = serializer.deserialize_from_bincode(&[0xFF; 3]);
    assert!(matches!(
        result,
        Err(SerializationError::Decode {
            format: Format::Bincode,
            ..
        })
    ));
}
