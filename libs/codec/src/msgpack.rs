//! MessagePack format
//!
//! Integers keep their width and sign through the wire, so a `UInt` above
//! `i64::MAX` decodes as `UInt` and whole floats stay `Float`.

use crate::error::CodecError;
use crate::Codec;
use types::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackCodec;

impl MsgpackCodec {
    pub const NAME: &'static str = "msgpack";
}

impl Codec for MsgpackCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec(value).map_err(|err| CodecError::encode(Self::NAME, err))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|err| CodecError::decode(Self::NAME, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{list, map};

    #[test]
    fn test_encode_small_values() {
        // fixarray of 3: nil, true, positive fixint 10
        let encoded = MsgpackCodec.encode(&Value::from(list![Value::Null, true, 10])).unwrap();
        assert_eq!(encoded, vec![0x93, 0xc0, 0xc3, 0x0a]);
    }

    #[test]
    fn test_map_and_float() {
        let value = Value::from(map! {"funds" => 2.0, "owner" => "alice"});
        let decoded = MsgpackCodec.decode(&MsgpackCodec.encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
        let decoded = decoded.get::<types::Map>().unwrap();
        assert!(matches!(decoded.find("funds"), Some(Value::Float(_))));
    }

    #[test]
    fn test_non_utf8_string_rejected() {
        // fixstr of length 2 holding invalid UTF-8
        assert!(MsgpackCodec.decode(&[0xa2, 0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_truncated_input_names_format() {
        let encoded = MsgpackCodec.encode(&Value::from(list!["Hello world"])).unwrap();
        let err = MsgpackCodec.decode(&encoded[..4]).unwrap_err();
        assert!(err.to_string().starts_with("msgpack decode failed"));
    }
}
