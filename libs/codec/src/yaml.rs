//! YAML format
//!
//! Plain scalars resolve through the YAML core schema, so `true` and `10`
//! decode as Bool and Int rather than strings.

use crate::error::CodecError;
use crate::Codec;
use types::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl YamlCodec {
    pub const NAME: &'static str = "yaml";
}

impl Codec for YamlCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|err| CodecError::encode(Self::NAME, err))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_yaml::from_slice(bytes).map_err(|err| CodecError::decode(Self::NAME, err))
    }
}
