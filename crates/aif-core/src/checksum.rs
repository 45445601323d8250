use crate::error::AifError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Optional prefix accepted when parsing, for manifests written by other tools.
const ALGORITHM_PREFIX: &str = "sha256:";

/// SHA-256 of a file's text with CRLF line endings folded to LF, stored as
/// lowercase hex. An untouched file checked out with `core.autocrlf` hashes
/// the same as the LF text the framework shipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum(String);

impl Checksum {
    pub fn of(text: &str) -> Self {
        let digest = if text.contains("\r\n") {
            Sha256::digest(text.replace("\r\n", "\n").as_bytes())
        } else {
            Sha256::digest(text.as_bytes())
        };
        Checksum(format!("{digest:x}"))
    }

    /// A checksum that no content hashes to. Used when a file has no
    /// recorded baseline, so the "unchanged since last update" test fails.
    pub fn unknown() -> Self {
        Checksum(String::new())
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        !self.is_unknown() && *self == Checksum::of(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Checksum {
    type Err = AifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .get(..ALGORITHM_PREFIX.len())
            .filter(|p| p.eq_ignore_ascii_case(ALGORITHM_PREFIX))
            .map_or(trimmed, |_| &trimmed[ALGORITHM_PREFIX.len()..]);
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AifError::InvalidChecksum(s.to_string()));
        }
        Ok(Checksum(hex.to_ascii_lowercase()))
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            Checksum::of("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn crlf_hashes_like_lf() {
        let lf = Checksum::of("a: 1\nb: 2\n");
        assert_eq!(Checksum::of("a: 1\r\nb: 2\r\n"), lf);
        assert!(lf.matches("a: 1\r\nb: 2\r\n"));
        // a lone CR is content, not a line ending
        assert_ne!(Checksum::of("a: 1\rb: 2\n"), Checksum::of("a: 1\nb: 2\n"));
        // a missing final newline still counts
        assert_ne!(Checksum::of("a: 1\nb: 2"), lf);
    }

    #[test]
    fn parse_accepts_prefix_and_uppercase() {
        let c = Checksum::of("line1\nline2\nline3");
        let upper = c.as_str().to_ascii_uppercase();
        assert_eq!(upper.parse::<Checksum>().unwrap(), c);
        assert_eq!(format!("sha256:{c}").parse::<Checksum>().unwrap(), c);
        assert_eq!(format!("SHA256:{c}").parse::<Checksum>().unwrap(), c);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "abc", "sha256:", &"g".repeat(64)] {
            assert!(bad.parse::<Checksum>().is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn unknown_matches_nothing() {
        let unknown = Checksum::unknown();
        assert!(!unknown.matches(""));
        assert!(!unknown.matches("anything"));
        assert!(Checksum::of("x").matches("x"));
    }

    #[test]
    fn serde_as_plain_string() {
        let c = Checksum::of("hello");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, format!("\"{c}\""));
        let back: Checksum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
