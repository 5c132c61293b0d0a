//! Format property tests
//!
//! Generated value trees survive an encode/decode cycle through every
//! built-in format, and encoding never mutates or aliases the input.

use codec::{formats, Codec, JsonCodec, MsgpackCodec};
use proptest::prelude::*;
use types::{List, Map, Value};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (i64::MAX as u64 + 1..=u64::MAX).prop_map(Value::UInt),
        (-1_000_000i32..1_000_000).prop_map(|i| Value::Float(f64::from(i) / 8.0)),
        "[a-zA-Z0-9_-]{0,16}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6)
                .prop_map(|items| Value::List(List::from_values(items))),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6).prop_map(|entries| {
                Value::Map(entries.into_iter().collect::<Map>())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn json_round_trip(value in arb_value()) {
        let encoded = JsonCodec.encode(&value).unwrap();
        prop_assert_eq!(JsonCodec.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn msgpack_round_trip(value in arb_value()) {
        let encoded = MsgpackCodec.encode(&value).unwrap();
        prop_assert_eq!(MsgpackCodec.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn msgpack_keeps_large_unsigned(u in (i64::MAX as u64 + 1)..=u64::MAX) {
        let encoded = MsgpackCodec.encode(&Value::UInt(u)).unwrap();
        prop_assert_eq!(MsgpackCodec.decode(&encoded).unwrap(), Value::UInt(u));
    }

    #[test]
    fn every_format_round_trips(value in arb_value()) {
        for codec in formats() {
            let encoded = codec.encode(&value).unwrap();
            let decoded = codec.decode(&encoded).unwrap();
            prop_assert_eq!(&decoded, &value, "format {}", codec.name());
        }
    }

    #[test]
    fn truncated_msgpack_never_panics(value in arb_value(), cut in 0usize..64) {
        let encoded = MsgpackCodec.encode(&value).unwrap();
        let cut = cut.min(encoded.len());
        let _ = MsgpackCodec.decode(&encoded[..cut]);
    }

    #[test]
    fn truncated_json_never_panics(value in arb_value(), cut in 0usize..64) {
        let encoded = JsonCodec.encode(&value).unwrap();
        let cut = cut.min(encoded.len());
        let _ = JsonCodec.decode(&encoded[..cut]);
    }
}
