//! Confidential Value
//!
//! An encrypted number paired with a publicly verifiable proof.
//!
//! ```text
//! ciphertext = version(1) || ephemeral_pub(32) || nonce(12) || sealed(8 + 16)
//! proof      = issuer_pub(32) || ed25519_signature(64)
//! ```
//!
//! Byte fields are hex strings in JSON and raw bytes in bincode.

use ed25519_dalek::VerifyingKey;
use serde::{Serialize, Deserialize};

use crate::core::hash::fingerprint;

/// Ciphertext format version.
pub const CIPHERTEXT_VERSION: u8 = 1;

/// Length of an X25519 public key.
pub const EPHEMERAL_LEN: usize = 32;

/// Length of a ChaCha20-Poly1305 nonce.
pub const NONCE_LEN: usize = 12;

/// Length of the encoded plaintext (u64 micro-units).
pub const PLAINTEXT_LEN: usize = 8;

/// Length of the Poly1305 tag.
pub const TAG_LEN: usize = 16;

/// Total ciphertext length.
pub const CIPHERTEXT_LEN: usize = 1 + EPHEMERAL_LEN + NONCE_LEN + PLAINTEXT_LEN + TAG_LEN;

/// Length of an Ed25519 public key.
pub const ISSUER_LEN: usize = 32;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Total proof length.
pub const PROOF_LEN: usize = ISSUER_LEN + SIGNATURE_LEN;

/// Encrypted value with its proof. Immutable once created.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfidentialValue {
    #[serde(with = "hex_bytes")]
    ciphertext: Vec<u8>,
    #[serde(with = "hex_bytes")]
    proof: Vec<u8>,
}

impl ConfidentialValue {
    /// Assemble from raw parts (e.g. received from the chain layer).
    ///
    /// No validation happens here; call [`crate::codec::verify`].
    pub fn from_parts(ciphertext: Vec<u8>, proof: Vec<u8>) -> Self {
        Self { ciphertext, proof }
    }

    /// Raw ciphertext bytes.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Raw proof bytes.
    pub fn proof(&self) -> &[u8] {
        &self.proof
    }

    /// Split back into parts.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.ciphertext, self.proof)
    }

    /// Short display-safe fingerprint of the ciphertext.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.ciphertext)
    }

    /// Issuer key embedded in the proof, if well-formed.
    pub fn issuer(&self) -> Option<VerifyingKey> {
        let bytes: &[u8; ISSUER_LEN] = self.proof.get(..ISSUER_LEN)?.try_into().ok()?;
        VerifyingKey::from_bytes(bytes).ok()
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

impl std::fmt::Debug for ConfidentialValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfidentialValue({})", self.fingerprint())
    }
}

/// Hex in human-readable formats, plain bytes otherwise.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;

    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            hex::encode(bytes).serialize(serializer)
        } else {
            bytes.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            hex::decode(text).map_err(D::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
