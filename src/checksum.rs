//! Checksum over the raw sources a compilation read

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Running SHA256 over every source file fed to the loader, in load order.
///
/// Two compilations that read byte-identical files in the same order produce
/// the same digest, so renderers can skip regenerating unchanged output.
#[derive(Clone, Default)]
pub struct SourceDigest {
    hasher: Sha256,
    sources: usize,
}

impl fmt::Debug for SourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDigest")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl SourceDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the raw bytes of one source file
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.sources += 1;
    }

    /// Number of sources hashed so far
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Hex digest of everything seen so far
    pub fn finish(&self) -> Checksum {
        Checksum(format!("{:x}", self.hasher.clone().finalize()))
    }
}

/// SHA256 checksum, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_consistency() {
        let mut a = SourceDigest::new();
        a.update(b"types: {}");
        let mut b = SourceDigest::new();
        b.update(b"types: {}");
        assert_eq!(a.finish(), b.finish());
        assert_eq!(a.source_count(), 1);
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let mut a = SourceDigest::new();
        a.update(b"one");
        a.update(b"two");
        let mut b = SourceDigest::new();
        b.update(b"two");
        b.update(b"one");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_single_source_matches_plain_checksum() {
        let mut digest = SourceDigest::new();
        digest.update(b"elements: {}");
        assert_eq!(digest.finish(), Checksum::from_bytes(b"elements: {}"));
    }
}
