//! XML-RPC value model shared by the encoder, decoder, and response processors.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// A decoded or to-be-encoded XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<string>` or an untyped `<value>`.
    String(String),
    /// `<i4>`, `<int>`, or `<i8>`.
    Int(i64),
    /// `<boolean>`.
    Bool(bool),
    /// `<double>`.
    Double(f64),
    /// `<base64>`.
    Base64(Vec<u8>),
    /// `<array>`.
    Array(Vec<Value>),
    /// `<struct>`.
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// Borrow the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Read an integer, accepting numeric strings and booleans the daemon sometimes returns.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bool(flag) => Some(i64::from(*flag)),
            Self::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read a truth value; integers are true when non-zero.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Int(value) => Some(*value != 0),
            Self::String(text) => match text.trim() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Borrow the array elements.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the struct members.
    #[must_use]
    pub const fn as_struct(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Convert into JSON for API-facing responses; binary payloads become base64 strings.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::String(text) => serde_json::Value::String(text),
            Self::Int(value) => serde_json::Value::from(value),
            Self::Bool(flag) => serde_json::Value::Bool(flag),
            Self::Double(value) => serde_json::Number::from_f64(value)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Base64(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
            Self::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Self::into_json).collect())
            }
            Self::Struct(members) => serde_json::Value::Object(
                members
                    .into_iter()
                    .map(|(name, value)| (name, value.into_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accessor_tolerates_daemon_quirks() {
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::from(" 42 ").as_i64(), Some(42));
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert_eq!(Value::Array(Vec::new()).as_i64(), None);
        assert_eq!(Value::Int(2).as_bool(), Some(true));
        assert_eq!(Value::from("0").as_bool(), Some(false));
    }

    #[test]
    fn json_conversion_preserves_structure() {
        let mut members = BTreeMap::new();
        members.insert("faultCode".to_string(), Value::Int(-501));
        let value = Value::Array(vec![
            Value::from("abc"),
            Value::Struct(members),
            Value::Base64(b"hi".to_vec()),
            Value::Double(1.5),
        ]);
        assert_eq!(
            value.into_json(),
            serde_json::json!(["abc", {"faultCode": -501}, "aGk=", 1.5])
        );
    }
}
