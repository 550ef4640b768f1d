//! Content hashing for artifact identity and cache invalidation.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to have identical
/// content. The hash names generated artifacts on disk and keys the persisted
/// cache, so its hex form must stay stable across processes and platforms.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 16]);

/// Error returned when parsing a [`ContentHash`] from its hex form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash '{input}': expected 32 lowercase hex characters")]
pub struct ParseContentHashError {
    /// The rejected input.
    pub input: String,
}

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Hashes `content` on top of an upstream identity.
    ///
    /// Equivalent to `from_bytes(upstream_hex + content)`, so an artifact
    /// derived from `content` changes whenever its upstream does.
    pub fn chained(upstream: &ContentHash, content: &str) -> Self {
        let mut data = upstream.to_string();
        data.push_str(content);
        Self::from_bytes(data.as_bytes())
    }

    /// Folds an ordered sequence of hashes into one identity.
    pub fn combine<'a>(hashes: impl IntoIterator<Item = &'a ContentHash>) -> Self {
        let mut data = String::new();
        for hash in hashes {
            data.push_str(&hash.to_string());
        }
        Self::from_bytes(data.as_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl FromStr for ContentHash {
    type Err = ParseContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseContentHashError {
            input: s.to_string(),
        };
        if s.len() != 32 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(err());
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| err())?;
        }
        Ok(Self(bytes))
    }
}

// Serialized as the hex string so hashes can key JSON maps.
impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = ContentHash;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 32-character hex content hash")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"hello world");
        let b = ContentHash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"hello");
        let b = ContentHash::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("ContentHash("));
        assert!(s.ends_with(")"));
    }

    #[test]
    fn parse_display_inverse() {
        let h = ContentHash::from_bytes(b"parse me");
        let parsed: ContentHash = h.to_string().parse().unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("abc".parse::<ContentHash>().is_err());
        assert!("zz".repeat(16).parse::<ContentHash>().is_err());
        assert!("AB".repeat(16).parse::<ContentHash>().is_err());
    }

    #[test]
    fn chained_matches_concatenation() {
        let upstream = ContentHash::from_bytes(b"schema");
        let chained = ContentHash::chained(&upstream, "query Viewer{viewer{id}}");
        let manual = ContentHash::from_bytes(format!("{upstream}query Viewer{{viewer{{id}}}}").as_bytes());
        assert_eq!(chained, manual);
    }

    #[test]
    fn chained_depends_on_upstream() {
        let s1 = ContentHash::from_bytes(b"type Query { a: Int }");
        let s2 = ContentHash::from_bytes(b"type Query { a: Int b: Int }");
        assert_ne!(
            ContentHash::chained(&s1, "{a}"),
            ContentHash::chained(&s2, "{a}")
        );
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = ContentHash::from_bytes(b"a");
        let b = ContentHash::from_bytes(b"b");
        assert_ne!(ContentHash::combine([&a, &b]), ContentHash::combine([&b, &a]));
        assert_eq!(ContentHash::combine([&a, &b]), ContentHash::combine([&a, &b]));
    }

    #[test]
    fn serde_as_map_key() {
        let h = ContentHash::from_bytes(b"serde test");
        let mut map = BTreeMap::new();
        map.insert(h, 1u32);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains(&h.to_string()));
        let back: BTreeMap<ContentHash, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[&h], 1);
    }
}
