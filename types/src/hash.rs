//! Content digests and chain links.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Placeholder previous-hash carried only by the first report in the ledger.
pub const GENESIS_SENTINEL: &str = "GENESIS_BLOCK";

/// A 32-byte SHA-256 digest of an uploaded artifact.
///
/// Serialized as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest. Uppercase input is accepted.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| ValidationError::InvalidHash(format!("{s:?}: {e}")))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// The link from a report to its predecessor in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviousHash {
    /// No predecessor: this is the first report ever inserted.
    Genesis,
    /// Content hash of the report immediately preceding this one.
    Hash(ContentHash),
}

impl PreviousHash {
    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis)
    }

    /// Whether this link points at `head` (or at nothing, when there is no head).
    pub fn links_to(&self, head: Option<&ContentHash>) -> bool {
        match (self, head) {
            (Self::Genesis, None) => true,
            (Self::Hash(prev), Some(head)) => prev == head,
            _ => false,
        }
    }
}

impl From<ContentHash> for PreviousHash {
    fn from(hash: ContentHash) -> Self {
        Self::Hash(hash)
    }
}

impl fmt::Display for PreviousHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genesis => f.write_str(GENESIS_SENTINEL),
            Self::Hash(h) => fmt::Display::fmt(h, f),
        }
    }
}

impl FromStr for PreviousHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GENESIS_SENTINEL {
            Ok(Self::Genesis)
        } else {
            ContentHash::from_hex(s).map(Self::Hash)
        }
    }
}

impl Serialize for PreviousHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PreviousHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_displays_as_sentinel() {
        assert_eq!(PreviousHash::Genesis.to_string(), "GENESIS_BLOCK");
        assert_eq!(
            "GENESIS_BLOCK".parse::<PreviousHash>().unwrap(),
            PreviousHash::Genesis
        );
    }

    #[test]
    fn hex_parse_rejects_wrong_length() {
        assert!(ContentHash::from_hex("abcd").is_err());
        assert!(ContentHash::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn uppercase_hex_normalizes() {
        let upper = "AB".repeat(32);
        let hash = ContentHash::from_hex(&upper).unwrap();
        assert_eq!(hash.to_hex(), "ab".repeat(32));
    }

    #[test]
    fn links_to_matches_head() {
        let a = ContentHash::new([1; 32]);
        let b = ContentHash::new([2; 32]);
        assert!(PreviousHash::Genesis.links_to(None));
        assert!(!PreviousHash::Genesis.links_to(Some(&a)));
        assert!(PreviousHash::Hash(a).links_to(Some(&a)));
        assert!(!PreviousHash::Hash(a).links_to(Some(&b)));
        assert!(!PreviousHash::Hash(a).links_to(None));
    }

    #[test]
    fn json_shape_is_plain_string() {
        let prev = PreviousHash::Hash(ContentHash::new([0xAB; 32]));
        let json = serde_json::to_string(&prev).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let genesis = serde_json::to_string(&PreviousHash::Genesis).unwrap();
        assert_eq!(genesis, "\"GENESIS_BLOCK\"");
    }
}
