//! Content hashes for downloaded package archives.
//!
//! Every archive stored in the session cache is recorded with its SHA-256
//! digest; a cache hit is only served when the bytes on disk still match.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash the given bytes.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        ContentHash(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `data` hashes to this digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        ContentHash::compute(data) == *self
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// The integrity record written next to a cached archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Package id as requested.
    pub id: String,
    /// Normalized package version.
    pub version: String,
    /// Digest of the `.nupkg` bytes.
    pub sha256: ContentHash,
    /// Archive size in bytes.
    pub size: u64,
}

impl ArchiveRecord {
    pub fn new(id: &str, version: &str, data: &[u8]) -> Self {
        ArchiveRecord {
            id: id.to_string(),
            version: version.to_string(),
            sha256: ContentHash::compute(data),
            size: data.len() as u64,
        }
    }

    /// Whether `data` is the archive this record describes.
    pub fn verify(&self, data: &[u8]) -> bool {
        data.len() as u64 == self.size && self.sha256.matches(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_digest() {
        assert_eq!(
            ContentHash::compute(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_detects_changes() {
        let hash = ContentHash::compute(b"nupkg bytes");
        assert!(hash.matches(b"nupkg bytes"));
        assert!(!hash.matches(b"nupkg bytez"));
        assert!(hash.to_string().starts_with("sha256:"));
    }

    #[test]
    fn record_checks_size_and_digest() {
        let record = ArchiveRecord::new("System.Memory", "4.5.5", b"archive");
        assert!(record.verify(b"archive"));
        assert!(!record.verify(b"archive!"));
        let json = serde_json::to_string(&record).unwrap();
        let back: ArchiveRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
