//! Opaque payload carried by requests and responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An opaque, serializable value.
///
/// The engine moves payloads between peers without inspecting them. Callers
/// convert to and from their own types with [`Payload::encode`] and
/// [`Payload::decode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    /// The empty payload, used when nobody wrote a result.
    pub fn null() -> Self {
        Self(Value::Null)
    }

    /// Encode any serializable value.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self)
    }

    /// Decode into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// Check if this is the null payload.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Borrow the underlying value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the underlying value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

macro_rules! payload_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Self(Value::from(value))
                }
            }
        )*
    };
}

payload_from!(bool, i32, i64, u32, u64, f64, String, &str);

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Position {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_payload_structs() {
        let payload = Payload::encode(&Position { x: 3, y: -1 }).unwrap();
        assert_eq!(payload.to_string(), r#"{"x":3,"y":-1}"#);
        assert_eq!(payload.decode::<Position>().unwrap(), Position { x: 3, y: -1 });
    }

    #[test]
    fn test_payload_decode_mismatch() {
        let payload = Payload::from("not a number");
        assert!(payload.decode::<i64>().is_err());
    }

    #[test]
    fn test_default_is_null() {
        assert!(Payload::default().is_null());
        assert!(!Payload::from(0).is_null());
    }
}
