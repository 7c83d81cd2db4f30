//! Oracle Capability and Caller Authentication
//!
//! Decryption and settlement are privileged. The capability is an [`Oracle`]
//! handle, which can only be built around the oracle's [`DecryptionKey`].
//! Identity comes from an external provider as a JWT: this module validates
//! it and checks the `role` claim, it never issues tokens.

use std::collections::HashSet;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::codec::{self, CodecError, ConfidentialValue, DecryptionKey, Odds, SealedOdds, SealedScores};
use crate::core::units::Units;
use crate::ledger::bet::BettorId;

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected issuer claim ("iss"). If None, any issuer accepted.
    pub issuer: Option<String>,
    /// Expected audience claim ("aud"). If None, any audience accepted.
    pub audience: Option<String>,
    /// RS256 public key in PEM format (preferred for external providers).
    pub public_key_pem: Option<String>,
    /// HS256 secret (fallback for simple setups).
    pub secret: Option<String>,
    /// Whether to skip expiry validation (for testing only).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            issuer: lookup("AUTH_ISSUER"),
            audience: lookup("AUTH_AUDIENCE"),
            public_key_pem: lookup("AUTH_PUBLIC_KEY_PEM"),
            secret: lookup("AUTH_SECRET"),
            skip_expiry: lookup("AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Check if authentication is configured.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Caller role carried in the `role` claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular wallet user.
    Bettor,
    /// Result oracle.
    Oracle,
    /// Protocol administrator.
    Admin,
}

impl Role {
    /// Oracle and admin may decrypt and settle.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Oracle | Role::Admin)
    }
}

/// JWT claims expected from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the caller's wallet address.
    pub sub: String,
    /// Expiry timestamp (Unix seconds).
    #[serde(default)]
    pub exp: u64,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Issuer (auth provider).
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Caller role; absent means bettor.
    #[serde(default)]
    pub role: Option<Role>,
}

impl TokenClaims {
    /// Effective role.
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::Bettor)
    }

    /// Wallet address from the subject claim.
    pub fn bettor_id(&self) -> Result<BettorId, AuthError> {
        BettorId::from_hex(&self.sub).ok_or_else(|| AuthError::InvalidSubject(self.sub.clone()))
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No authentication configured.
    #[error("authentication not configured")]
    NotConfigured,
    /// Token format is invalid.
    #[error("invalid token format")]
    InvalidFormat,
    /// Token signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// Token has expired.
    #[error("token expired")]
    Expired,
    /// Issuer claim doesn't match expected value.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Audience claim doesn't match expected value.
    #[error("invalid audience")]
    InvalidAudience,
    /// Required claim is missing.
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Subject is not a wallet address.
    #[error("subject is not a wallet address: {0}")]
    InvalidSubject(String),
    /// Role may not use the privileged entry point.
    #[error("role {0:?} is not permitted")]
    Forbidden(Role),
    /// JWT decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Validate a JWT token and extract claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let (key, algorithm) = if let Some(ref pem) = config.public_key_pem {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::DecodeError(format!("invalid public key: {}", e)))?;
        (key, Algorithm::RS256)
    } else if let Some(ref secret) = config.secret {
        (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    } else {
        return Err(AuthError::NotConfigured);
    };

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = HashSet::new();

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }

    if let Some(ref audience) = config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }

    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let token_data: TokenData<TokenClaims> = decode(token, &key, &validation).map_err(map_jwt_error)?;
    let claims = token_data.claims;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub".into()));
    }

    // exp = 0 means the provider did not set one
    if !config.skip_expiry && claims.exp > 0 {
        let now = Utc::now().timestamp().max(0) as u64;
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
    }

    Ok(claims)
}

/// Map JWT library errors to our error type.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}

// =============================================================================
// ORACLE CAPABILITY
// =============================================================================

/// Privileged handle: the only way the rest of the crate decrypts.
#[derive(Clone, Copy, Debug)]
pub struct Oracle<'k> {
    key: &'k DecryptionKey,
    role: Role,
}

impl<'k> Oracle<'k> {
    /// Holding the oracle secret is itself the authorization.
    pub fn from_key(key: &'k DecryptionKey) -> Self {
        Self { key, role: Role::Oracle }
    }

    /// Role the capability was granted to.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Decrypt a single value.
    pub fn decrypt(&self, cv: &ConfidentialValue) -> Result<Units, CodecError> {
        debug!(fingerprint = %cv.fingerprint(), role = ?self.role, "oracle decrypt");
        codec::decrypt(cv, self.key)
    }

    /// Decrypt a score pair.
    pub fn decrypt_scores(&self, scores: &SealedScores) -> Result<(Units, Units), CodecError> {
        codec::decrypt_scores(scores, self.key)
    }

    /// Decrypt three-way odds.
    pub fn decrypt_odds(&self, odds: &SealedOdds) -> Result<Odds, CodecError> {
        codec::decrypt_odds(odds, self.key)
    }
}

/// Mint an [`Oracle`] for a caller presenting a privileged token.
pub fn authorize_oracle<'k>(
    token: &str,
    config: &AuthConfig,
    key: &'k DecryptionKey,
) -> Result<Oracle<'k>, AuthError> {
    let claims = validate_token(token, config)?;
    let role = claims.role();
    if !role.is_privileged() {
        return Err(AuthError::Forbidden(role));
    }
    debug!(sub = %claims.sub, ?role, "oracle capability granted");
    Ok(Oracle { key, role })
}

// =============================================================================
// TESTS
// =============================================================================
