//! Key Material
//!
//! Two halves with different holders:
//!
//! - [`EncryptionKey`]: oracle X25519 public key + the issuer's Ed25519
//!   signing key. Held by whoever seals values (bettor clients, match admin).
//! - [`DecryptionKey`]: oracle X25519 static secret. Held by the oracle only.

use std::fmt;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::codec::CodecError;
use crate::core::hash::{hash_with_domain, key_id};

const ORACLE_SEED_DOMAIN: &[u8] = b"SECRET_STADIUM_ORACLE_SEED_V1";
const ISSUER_SEED_DOMAIN: &[u8] = b"SECRET_STADIUM_ISSUER_SEED_V1";

/// Sealing half: encrypt to the oracle and sign the ciphertext.
#[derive(Clone)]
pub struct EncryptionKey {
    recipient: PublicKey,
    signer: SigningKey,
}

impl EncryptionKey {
    /// Combine the oracle public key with an issuer signing key.
    pub fn new(recipient: PublicKey, signer: SigningKey) -> Self {
        Self { recipient, signer }
    }

    /// Oracle public key values are sealed to.
    pub fn recipient(&self) -> &PublicKey {
        &self.recipient
    }

    /// Issuer verifying key, embedded in every proof.
    pub fn issuer(&self) -> VerifyingKey {
        self.signer.verifying_key()
    }

    pub(crate) fn signer(&self) -> &SigningKey {
        &self.signer
    }

    /// Identifier of the issuer key (for logs).
    pub fn issuer_id(&self) -> String {
        hex::encode(key_id(self.issuer().as_bytes()))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("recipient", &hex::encode(key_id(self.recipient.as_bytes())))
            .field("issuer", &self.issuer_id())
            .finish()
    }
}

/// Opening half: the oracle secret.
#[derive(Clone)]
pub struct DecryptionKey {
    secret: StaticSecret,
}

impl DecryptionKey {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { secret: StaticSecret::from(bytes) }
    }

    /// Public key bettors seal to.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(&self.secret)
    }

    /// Build an encryption key that seals to this oracle with `signer`.
    pub fn encryption_key(&self, signer: SigningKey) -> EncryptionKey {
        EncryptionKey::new(self.public_key(), signer)
    }

    /// Identifier of the oracle key (for logs).
    pub fn key_id(&self) -> String {
        hex::encode(key_id(self.public_key().as_bytes()))
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

/// Generate a fresh oracle secret and issuer signing key.
pub fn generate() -> (EncryptionKey, DecryptionKey) {
    let decryption = DecryptionKey {
        secret: StaticSecret::random_from_rng(OsRng),
    };
    let signer = SigningKey::generate(&mut OsRng);
    (decryption.encryption_key(signer), decryption)
}

/// Derive both halves from a 32-byte seed.
///
/// Same seed, same keys. Used for configured deployments and fixtures.
pub fn derive_from_seed(seed: &[u8; 32]) -> (EncryptionKey, DecryptionKey) {
    let decryption = DecryptionKey::from_bytes(hash_with_domain(ORACLE_SEED_DOMAIN, seed));
    let signer = SigningKey::from_bytes(&hash_with_domain(ISSUER_SEED_DOMAIN, seed));
    (decryption.encryption_key(signer), decryption)
}

/// Fresh issuer signing key for a bettor client.
pub fn generate_issuer() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Parse a hex-encoded 32-byte seed.
pub fn parse_seed_hex(text: &str) -> Result<[u8; 32], CodecError> {
    let trimmed = text.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed)
        .map_err(|e| CodecError::KeyMaterial(format!("seed is not hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| CodecError::KeyMaterial(format!("seed must be 32 bytes, got {}", b.len())))
}

// =============================================================================
// TESTS
// =============================================================================
