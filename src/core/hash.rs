//! Domain-Separated Hashing
//!
//! SHA-256 helpers shared by the codec, the redacted views and the journal:
//! - Ciphertext fingerprints (safe to display)
//! - Key identifiers for logs
//! - Journal chain digests

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type Digest32 = [u8; 32];

/// Domain for ciphertext fingerprints.
pub const FINGERPRINT_DOMAIN: &[u8] = b"SECRET_STADIUM_FINGERPRINT_V1";

/// Domain for key identifiers.
pub const KEY_ID_DOMAIN: &[u8] = b"SECRET_STADIUM_KEY_ID_V1";

/// Domain for journal entries.
pub const JOURNAL_DOMAIN: &[u8] = b"SECRET_STADIUM_JOURNAL_V1";

/// Incremental hasher with a domain separator.
///
/// Order of updates is part of the digest.
pub struct RecordHasher {
    hasher: Sha256,
}

impl RecordHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for journal entries.
    pub fn for_journal() -> Self {
        Self::new(JOURNAL_DOMAIN)
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with length-prefixed bytes, so adjacent fields cannot run
    /// into each other.
    #[inline]
    pub fn update_framed(&mut self, bytes: &[u8]) {
        self.update_u64(bytes.len() as u64);
        self.hasher.update(bytes);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Digest32 {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Short display fingerprint of opaque bytes (first 8 bytes, hex).
pub fn fingerprint(data: &[u8]) -> String {
    let digest = hash_with_domain(FINGERPRINT_DOMAIN, data);
    hex::encode(&digest[..8])
}

/// Eight-byte identifier for a public key.
pub fn key_id(public_key: &[u8]) -> [u8; 8] {
    let digest = hash_with_domain(KEY_ID_DOMAIN, public_key);
    let mut id = [0u8; 8];
    id.copy_from_slice(&digest[..8]);
    id
}

// =============================================================================
// TESTS
// =============================================================================
