//! Confidential Value Codec
//!
//! Encrypts, decrypts and verifies individual numeric values.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONFIDENTIAL CODEC                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  keys.rs    - Oracle X25519 secret, issuer Ed25519 signer    │
//! │  value.rs   - ConfidentialValue layout and serialization     │
//! │  cipher.rs  - encrypt / decrypt / verify                     │
//! │  batch.rs   - Score pairs, three-way odds, generic batches   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `verify` is public and needs no secret. `decrypt` needs the oracle's
//! [`DecryptionKey`]; route it through [`crate::auth::Oracle`].

use thiserror::Error;

use crate::core::units::UnitsError;

pub mod keys;
pub mod value;
pub mod cipher;
pub mod batch;

// Re-export key types
pub use keys::{EncryptionKey, DecryptionKey};
pub use value::ConfidentialValue;
pub use cipher::{encrypt, encrypt_decimal, decrypt, verify, verify_issued_by};
pub use batch::{
    SealedScores, SealedOdds, Odds,
    encrypt_scores, decrypt_scores, encrypt_odds, decrypt_odds,
    encrypt_batch, decrypt_batch,
};

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Input value cannot be represented.
    #[error("encoding error: {0}")]
    Encoding(#[from] UnitsError),

    /// Ciphertext malformed or key mismatch.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Key bytes invalid.
    #[error("invalid key material: {0}")]
    KeyMaterial(String),

    /// AEAD refused to seal.
    #[error("sealing failed: {0}")]
    Sealing(String),
}
