use serde::{Serialize, Deserialize};
use thiserror::Error;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Range;

mod parsing;

/// Represents a value in the Bencode format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BencodedValue {
    /// Represents a Bencoded dictionary (key-value pairs).
    Dict(BTreeMap<Vec<u8>, BencodedValue>),

    /// Represents a Bencoded list of values.
    List(Vec<BencodedValue>),

    /// Represents a Bencoded integer.
    Integer(i64),

    /// Represents a Bencoded byte string.
    ByteString(Vec<u8>),
}

/// The single error kind of the codec. `offset` points at the byte where
/// decoding gave up, when one is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct MalformedInput {
    pub reason: String,
    pub offset: Option<usize>,
}

impl MalformedInput {
    pub fn new(reason: impl Into<String>, offset: usize) -> Self {
        Self {
            reason: reason.into(),
            offset: Some(offset),
        }
    }
}

impl Display for MalformedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "malformed bencode: {} at byte {}", self.reason, offset),
            None => write!(f, "malformed bencode: {}", self.reason),
        }
    }
}

impl BencodedValue {
    pub fn from_bytes(bytes: &[u8]) -> Result<BencodedValue, MalformedInput> {
        parsing::decode(bytes)
    }

    /// Decodes `bytes` and also returns the exact byte range of the value
    /// stored under `key` in the root dictionary.
    pub fn from_bytes_capturing(bytes: &[u8], key: &[u8]) -> Result<(BencodedValue, Option<Range<usize>>), MalformedInput> {
        parsing::decode_capturing(bytes, key)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        parsing::encode(self)
    }

    pub fn try_into_dict(&self) -> Option<&BTreeMap<Vec<u8>, BencodedValue>> {
        match self {
            BencodedValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn try_into_integer(&self) -> Option<i64> {
        match self {
            BencodedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn try_into_list(&self) -> Option<&Vec<BencodedValue>> {
        match self {
            BencodedValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn try_into_byte_string(&self) -> Option<&Vec<u8>> {
        match self {
            BencodedValue::ByteString(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_from_dict(&self, key: &[u8]) -> Option<&BencodedValue> {
        self.try_into_dict()?.get(key)
    }
}

impl From<&str> for BencodedValue {
    fn from(value: &str) -> Self {
        BencodedValue::ByteString(value.as_bytes().to_vec())
    }
}

impl From<i64> for BencodedValue {
    fn from(value: i64) -> Self {
        BencodedValue::Integer(value)
    }
}

impl FromIterator<(&'static str, BencodedValue)> for BencodedValue {
    fn from_iter<T: IntoIterator<Item = (&'static str, BencodedValue)>>(iter: T) -> Self {
        BencodedValue::Dict(
            iter.into_iter()
                .map(|(key, value)| (key.as_bytes().to_vec(), value))
                .collect(),
        )
    }
}
