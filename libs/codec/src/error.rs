//! Codec errors
//!
//! Encoding and decoding failures carry the format name and the underlying
//! serializer error so transports can report them verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// No codec is registered under this name
    #[error("unknown format {name}")]
    UnknownFormat { name: String },

    /// A value could not be written in this format
    #[error("{format} encode failed: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Input bytes are not a valid document in this format
    #[error("{format} decode failed: {source}")]
    Decode {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CodecError {
    pub fn unknown_format(name: impl Into<String>) -> Self {
        Self::UnknownFormat { name: name.into() }
    }

    pub fn encode(format: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Encode {
            format,
            source: Box::new(source),
        }
    }

    pub fn decode(format: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Decode {
            format,
            source: Box::new(source),
        }
    }
}

impl From<CodecError> for types::Error {
    fn from(err: CodecError) -> Self {
        types::Error::new(err.to_string())
    }
}
