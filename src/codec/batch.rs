//! Batch Sealing
//!
//! Related values (a score pair, three-way odds) are sealed independently:
//! every element gets its own ephemeral key and nonce. A batch either fully
//! succeeds or returns the first error.

use serde::{Serialize, Deserialize};

use crate::codec::cipher::{decrypt, encrypt, verify};
use crate::codec::keys::{DecryptionKey, EncryptionKey};
use crate::codec::value::ConfidentialValue;
use crate::codec::CodecError;
use crate::core::units::Units;

/// Encrypt each value independently. All-or-nothing.
pub fn encrypt_batch(values: &[Units], key: &EncryptionKey) -> Result<Vec<ConfidentialValue>, CodecError> {
    values.iter().map(|v| encrypt(*v, key)).collect()
}

/// Decrypt each value independently. All-or-nothing.
pub fn decrypt_batch(values: &[ConfidentialValue], key: &DecryptionKey) -> Result<Vec<Units>, CodecError> {
    values.iter().map(|cv| decrypt(cv, key)).collect()
}

/// Sealed home/away score pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedScores {
    /// Home side score.
    pub home: ConfidentialValue,
    /// Away side score.
    pub away: ConfidentialValue,
}

impl SealedScores {
    /// Both proofs verify.
    pub fn verify(&self) -> bool {
        verify(&self.home) && verify(&self.away)
    }
}

/// Sealed three-way decimal odds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedOdds {
    /// Odds for a home win.
    pub home: ConfidentialValue,
    /// Odds for a draw.
    pub draw: ConfidentialValue,
    /// Odds for an away win.
    pub away: ConfidentialValue,
}

impl SealedOdds {
    /// All three proofs verify.
    pub fn verify(&self) -> bool {
        verify(&self.home) && verify(&self.draw) && verify(&self.away)
    }
}

/// Opened three-way decimal odds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    /// Odds for a home win.
    pub home: Units,
    /// Odds for a draw.
    pub draw: Units,
    /// Odds for an away win.
    pub away: Units,
}

/// Seal a score pair.
pub fn encrypt_scores(home: Units, away: Units, key: &EncryptionKey) -> Result<SealedScores, CodecError> {
    Ok(SealedScores {
        home: encrypt(home, key)?,
        away: encrypt(away, key)?,
    })
}

/// Open a score pair.
pub fn decrypt_scores(scores: &SealedScores, key: &DecryptionKey) -> Result<(Units, Units), CodecError> {
    Ok((decrypt(&scores.home, key)?, decrypt(&scores.away, key)?))
}

/// Seal three-way odds.
pub fn encrypt_odds(odds: Odds, key: &EncryptionKey) -> Result<SealedOdds, CodecError> {
    Ok(SealedOdds {
        home: encrypt(odds.home, key)?,
        draw: encrypt(odds.draw, key)?,
        away: encrypt(odds.away, key)?,
    })
}

/// Open three-way odds.
pub fn decrypt_odds(odds: &SealedOdds, key: &DecryptionKey) -> Result<Odds, CodecError> {
    Ok(Odds {
        home: decrypt(&odds.home, key)?,
        draw: decrypt(&odds.draw, key)?,
        away: decrypt(&odds.away, key)?,
    })
}
