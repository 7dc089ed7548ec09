//! Pluggable frame serialization.
//!
//! The [`MessageCodec`] trait turns envelopes into the byte frames a
//! transport carries. [`JsonCodec`] is the default: human-readable, which
//! makes captured frames easy to read while debugging.
//!
//! # Implementing Custom Codecs
//!
//! ```rust,ignore
//! #[derive(Clone, Default)]
//! struct BincodeCodec;
//!
//! impl MessageCodec for BincodeCodec {
//!     fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, CodecError> {
//!         bincode::serialize(msg).map_err(|e| CodecError::Encode(e.into()))
//!     }
//!
//!     fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, CodecError> {
//!         bincode::deserialize(buf).map_err(|e| CodecError::Decode(e.into()))
//!     }
//! }
//! ```

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Pluggable frame serialization format.
pub trait MessageCodec: Clone + 'static {
    /// Encode a serializable message to bytes.
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes to a deserializable message.
    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec using serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(msg).map_err(|e| CodecError::Encode(Box::new(e)))
    }

    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(buf).map_err(|e| CodecError::Decode(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RequestId;
    use crate::messaging::{Envelope, Payload};

    #[test]
    fn test_json_codec_envelope() {
        let codec = JsonCodec;
        let envelope = Envelope::Success {
            id: RequestId::new(11),
            value: Payload::from("pong"),
        };

        let bytes = codec.encode(&envelope).unwrap();
        let decoded: Envelope = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"\x00not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_json_codec_rejects_unknown_kind() {
        let result: Result<Envelope, _> = JsonCodec.decode(br#"{"kind":"gossip","id":1}"#);
        assert!(result.is_err());
    }
}
