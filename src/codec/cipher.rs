//! Seal, Open and Verify
//!
//! Sealing is ECIES over X25519: a fresh ephemeral key per value, HKDF-SHA256
//! for the symmetric key, ChaCha20-Poly1305 for the payload. The issuer then
//! signs the ciphertext with Ed25519, so anyone can check a value was produced
//! by a key holder without learning it.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use ed25519_dalek::{Signature, Signer, VerifyingKey};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::codec::keys::{DecryptionKey, EncryptionKey};
use crate::codec::value::{
    ConfidentialValue, CIPHERTEXT_LEN, CIPHERTEXT_VERSION, EPHEMERAL_LEN, ISSUER_LEN,
    NONCE_LEN, PLAINTEXT_LEN, PROOF_LEN,
};
use crate::codec::CodecError;
use crate::core::units::{Units, UnitsError};

/// Associated data prefix for the AEAD.
const AEAD_DOMAIN: &[u8] = b"SECRET_STADIUM_VALUE_V1";

/// Prefix of the signed proof message.
const PROOF_DOMAIN: &[u8] = b"SECRET_STADIUM_PROOF_V1";

/// HKDF info string.
const HKDF_INFO: &[u8] = b"secret-stadium/value-key";

/// Encrypt a value and attach its proof.
///
/// Never deterministic: equal values give unrelated ciphertexts.
pub fn encrypt(value: Units, key: &EncryptionKey) -> Result<ConfidentialValue, CodecError> {
    if !value.in_range() {
        return Err(CodecError::Encoding(UnitsError::OutOfRange(value.to_string())));
    }

    let ephemeral = StaticSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(key.recipient());

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = value_cipher(shared.as_bytes(), ephemeral_public.as_bytes())?;
    let aad = associated_data(ephemeral_public.as_bytes());
    let plaintext = value.raw().to_le_bytes();
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: &plaintext, aad: &aad })
        .map_err(|e| CodecError::Sealing(e.to_string()))?;

    let mut ciphertext = Vec::with_capacity(CIPHERTEXT_LEN);
    ciphertext.push(CIPHERTEXT_VERSION);
    ciphertext.extend_from_slice(ephemeral_public.as_bytes());
    ciphertext.extend_from_slice(&nonce);
    ciphertext.extend_from_slice(&sealed);

    let signature = key.signer().sign(&proof_message(&ciphertext));
    let mut proof = Vec::with_capacity(PROOF_LEN);
    proof.extend_from_slice(key.issuer().as_bytes());
    proof.extend_from_slice(&signature.to_bytes());

    Ok(ConfidentialValue::from_parts(ciphertext, proof))
}

/// Convert a decimal at the boundary, then encrypt.
pub fn encrypt_decimal(value: f64, key: &EncryptionKey) -> Result<ConfidentialValue, CodecError> {
    encrypt(Units::from_decimal(value)?, key)
}

/// Decrypt a value. Privileged: only the oracle holds a [`DecryptionKey`].
///
/// Does not check the proof; callers that accept values from outside run
/// [`verify`] first.
pub fn decrypt(cv: &ConfidentialValue, key: &DecryptionKey) -> Result<Units, CodecError> {
    let ciphertext = cv.ciphertext();
    if ciphertext.len() != CIPHERTEXT_LEN {
        return Err(CodecError::Decryption(format!(
            "ciphertext must be {} bytes, got {}",
            CIPHERTEXT_LEN,
            ciphertext.len()
        )));
    }
    if ciphertext[0] != CIPHERTEXT_VERSION {
        return Err(CodecError::Decryption(format!("unknown ciphertext version {}", ciphertext[0])));
    }

    let (ephemeral_bytes, rest) = ciphertext[1..].split_at(EPHEMERAL_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let ephemeral: [u8; EPHEMERAL_LEN] = ephemeral_bytes
        .try_into()
        .map_err(|_| CodecError::Decryption("truncated ephemeral key".into()))?;
    let ephemeral_public = PublicKey::from(ephemeral);
    let shared = key.secret().diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(CodecError::Decryption("low-order ephemeral key".into()));
    }

    let cipher = value_cipher(shared.as_bytes(), ephemeral_public.as_bytes())?;
    let aad = associated_data(ephemeral_public.as_bytes());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: sealed, aad: &aad })
        .map_err(|_| CodecError::Decryption("authentication failed (wrong key or corrupted ciphertext)".into()))?;

    let raw: [u8; PLAINTEXT_LEN] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::Decryption("unexpected plaintext length".into()))?;
    Units::from_raw(u64::from_le_bytes(raw))
        .map_err(|e| CodecError::Decryption(format!("plaintext out of range: {}", e)))
}

/// Check the ciphertext/proof pair without any secret.
///
/// Returns `false` for anything structurally invalid; never panics.
pub fn verify(cv: &ConfidentialValue) -> bool {
    let ciphertext = cv.ciphertext();
    let proof = cv.proof();
    if ciphertext.len() != CIPHERTEXT_LEN || ciphertext[0] != CIPHERTEXT_VERSION {
        return false;
    }
    if proof.len() != PROOF_LEN {
        return false;
    }

    let (issuer_bytes, signature_bytes) = proof.split_at(ISSUER_LEN);
    let Ok(issuer_bytes) = <[u8; ISSUER_LEN]>::try_from(issuer_bytes) else {
        return false;
    };
    let Ok(issuer) = VerifyingKey::from_bytes(&issuer_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature_bytes) else {
        return false;
    };

    issuer.verify_strict(&proof_message(ciphertext), &signature).is_ok()
}

/// [`verify`], and additionally require a specific issuer.
pub fn verify_issued_by(cv: &ConfidentialValue, issuer: &VerifyingKey) -> bool {
    verify(cv) && cv.issuer().as_ref() == Some(issuer)
}

fn value_cipher(shared: &[u8; 32], ephemeral_public: &[u8; 32]) -> Result<ChaCha20Poly1305, CodecError> {
    let hk = Hkdf::<Sha256>::new(Some(ephemeral_public), shared);
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| CodecError::KeyMaterial(format!("hkdf expand: {}", e)))?;
    let cipher = ChaCha20Poly1305::new_from_slice(&okm)
        .map_err(|e| CodecError::KeyMaterial(format!("cipher key: {}", e)));
    okm.zeroize();
    cipher
}

fn associated_data(ephemeral_public: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AEAD_DOMAIN.len() + 1 + ephemeral_public.len());
    aad.extend_from_slice(AEAD_DOMAIN);
    aad.push(CIPHERTEXT_VERSION);
    aad.extend_from_slice(ephemeral_public);
    aad
}

fn proof_message(ciphertext: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(PROOF_DOMAIN.len() + ciphertext.len());
    message.extend_from_slice(PROOF_DOMAIN);
    message.extend_from_slice(ciphertext);
    message
}

// =============================================================================
// TESTS
// =============================================================================
