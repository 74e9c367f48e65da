//! Content digests for release notes artifacts
//!
//! A checksum is the SHA256 of the downloaded bytes, rendered as lowercase
//! hex. It names the stored artifact and is what the cache store records
//! for a resolved commit.

use crate::error::{RelcacheError, RelcacheResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA256 digest of an artifact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Compute the checksum of a byte blob
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Accept a previously recorded digest string.
    ///
    /// The value becomes part of a file name, so only ASCII alphanumerics
    /// are allowed.
    pub fn parse(value: &str) -> RelcacheResult<Self> {
        if value.is_empty() {
            return Err(RelcacheError::InvalidChecksum {
                value: value.to_string(),
                reason: "empty digest".to_string(),
            });
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RelcacheError::InvalidChecksum {
                value: value.to_string(),
                reason: "must contain only ASCII letters and digits".to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Borrow the digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for human-facing output
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Checksum::parse(&value).map_err(serde::de::Error::custom)
    }
}
