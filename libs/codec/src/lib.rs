//! # Value Codecs
//!
//! Byte encodings for [`types::Value`] used by transports and configuration.
//!
//! ```text
//! Value ──encode──▶ bytes ──(socket)──▶ bytes ──decode──▶ Value
//! ```
//!
//! Every format implements [`Codec`]; [`by_name`] resolves the format named
//! in a request frame or a configuration file.
//!
//! ```rust
//! use codec::{by_name, Codec};
//! use types::{list, Value};
//!
//! let json = by_name("json").unwrap();
//! let bytes = json.encode(&Value::from(list![1, "two"])).unwrap();
//! assert_eq!(bytes, br#"[1,"two"]"#);
//! assert_eq!(json.decode(&bytes).unwrap(), Value::from(list![1, "two"]));
//! ```

pub mod error;
pub mod json;
pub mod msgpack;
pub mod yaml;

pub use error::CodecError;
pub use json::JsonCodec;
pub use msgpack::MsgpackCodec;
pub use yaml::YamlCodec;

use types::Value;

/// A named, stateless byte encoding for values
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

static FORMATS: [&'static (dyn Codec); 3] = [&JsonCodec, &YamlCodec, &MsgpackCodec];

/// Every built-in format
pub fn formats() -> &'static [&'static dyn Codec] {
    &FORMATS
}

/// Look up a built-in format
pub fn by_name(name: &str) -> Option<&'static dyn Codec> {
    let found = FORMATS.iter().copied().find(|codec| codec.name() == name);
    if found.is_none() {
        tracing::debug!(format = name, "Unknown codec requested");
    }
    found
}

/// Like [`by_name`], failing with [`CodecError::UnknownFormat`]
pub fn require(name: &str) -> Result<&'static dyn Codec, CodecError> {
    by_name(name).ok_or_else(|| CodecError::unknown_format(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    impl std::fmt::Debug for dyn Codec {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.name())
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("json").map(|c| c.name()), Some("json"));
        assert_eq!(by_name("yaml").map(|c| c.name()), Some("yaml"));
        assert_eq!(by_name("msgpack").map(|c| c.name()), Some("msgpack"));
        assert_eq!(
            require("xml").unwrap_err().to_string(),
            "unknown format xml"
        );
    }

    #[test]
    fn test_format_names_unique() {
        let names: Vec<_> = formats().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["json", "yaml", "msgpack"]);
    }
}
