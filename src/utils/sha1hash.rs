use std::fmt::Display;

use percent_encoding::percent_encode;
use serde::{Serialize, Deserialize};
use sha1::{Digest, Sha1};

use crate::utils::UrlEncodable;

/// Represents a SHA-1 hash as an array of 20 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha1Hash(pub [u8; 20]);

impl UrlEncodable for Sha1Hash {
    fn as_url_encoded(&self) -> String {
        percent_encode(&self.0, percent_encoding::NON_ALPHANUMERIC).to_string()
    }
}

impl Display for Sha1Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Sha1Hash {
    fn from(hash: [u8; 20]) -> Self {
        Sha1Hash(hash)
    }
}

impl Sha1Hash {
    pub fn from_hex(hex: &str) -> Option<Sha1Hash> {
        let bytes = hex::decode(hex).ok()?;
        let hash: [u8; 20] = bytes.try_into().ok()?;

        Some(Sha1Hash(hash))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

pub fn sha1_hash(value: &[u8]) -> Sha1Hash {
    let mut hasher = Sha1::new();
    hasher.update(value);

    Sha1Hash(hasher.finalize().into())
}
