//! Desk Configuration
//!
//! Read once at startup from the environment:
//!
//! | Variable                  | Meaning                                  | Default  |
//! |---------------------------|------------------------------------------|----------|
//! | `STADIUM_KEY_SEED`        | 32-byte hex seed for the oracle keys     | random   |
//! | `STADIUM_BET_CUTOFF_SECS` | Betting closes this long before the end  | `0`      |
//! | `STADIUM_LOG`             | Log filter when `RUST_LOG` is unset      | `info`   |
//! | `AUTH_*`                  | See [`AuthConfig::from_lookup`]          |          |

use chrono::Duration;
use thiserror::Error;

use crate::auth::AuthConfig;
use crate::codec::keys::{self, DecryptionKey, EncryptionKey};
use crate::codec::CodecError;

/// Default log filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Seed is not 32 hex-encoded bytes.
    #[error("STADIUM_KEY_SEED: {0}")]
    InvalidSeed(CodecError),

    /// Cutoff is not a whole number of seconds.
    #[error("STADIUM_BET_CUTOFF_SECS: {0:?} is not a number of seconds")]
    InvalidCutoff(String),
}

/// Desk configuration.
#[derive(Clone, Debug)]
pub struct DeskConfig {
    /// Seed for deterministic oracle keys. None means fresh random keys.
    pub key_seed: Option<[u8; 32]>,
    /// How long before `end_time` betting closes.
    pub bet_cutoff: Duration,
    /// Fallback tracing filter.
    pub log_filter: String,
    /// JWT validation for the oracle entry point.
    pub auth: AuthConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            key_seed: None,
            bet_cutoff: Duration::zero(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl DeskConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let auth = AuthConfig::from_lookup(&lookup);
        let key_seed = lookup("STADIUM_KEY_SEED")
            .map(|text| keys::parse_seed_hex(&text).map_err(ConfigError::InvalidSeed))
            .transpose()?;

        let bet_cutoff = match lookup("STADIUM_BET_CUTOFF_SECS") {
            Some(text) => text
                .trim()
                .parse::<u32>()
                .map(|secs| Duration::seconds(secs.into()))
                .map_err(|_| ConfigError::InvalidCutoff(text))?,
            None => Duration::zero(),
        };

        Ok(Self {
            key_seed,
            bet_cutoff,
            log_filter: lookup("STADIUM_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            auth,
        })
    }

    /// Oracle key pair: derived from the seed when set, random otherwise.
    pub fn keys(&self) -> (EncryptionKey, DecryptionKey) {
        match &self.key_seed {
            Some(seed) => keys::derive_from_seed(seed),
            None => keys::generate(),
        }
    }
}
