//! Bet Records
//!
//! The bet shape persisted and broadcast by the chain layer.

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::ConfidentialValue;
use crate::registry::state::{MatchId, Outcome};

/// Side a bet backs. Same three-way set as the match outcome.
pub type BetType = Outcome;

// =============================================================================
// IDS
// =============================================================================

/// Bet identifier, assigned monotonically from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(pub u64);

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bet#{}", self.0)
    }
}

/// Wallet address of a bettor (20 bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BettorId(pub [u8; 20]);

impl BettorId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed (or bare) hex address.
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(digits).ok()?;
        Some(Self(bytes.try_into().ok()?))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for BettorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BettorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BettorId({})", self)
    }
}

impl Serialize for BettorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BettorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        BettorId::from_hex(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid wallet address: {}", text)))
    }
}

// =============================================================================
// BET
// =============================================================================

/// Settlement state. A bet leaves `Pending` at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    /// Not settled yet.
    Pending,
    /// Settled, backed the outcome.
    Won,
    /// Settled, backed another outcome.
    Lost,
}

/// A wager with a sealed amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Identifier.
    pub id: BetId,
    /// Match the bet is on (weak reference).
    pub match_id: MatchId,
    /// Sealed stake.
    pub amount: ConfidentialValue,
    /// Backed side.
    pub bet_type: BetType,
    /// Wallet that placed it.
    pub bettor: BettorId,
    /// Placement time.
    pub placed_at: DateTime<Utc>,
    /// Settlement state.
    pub status: BetStatus,
}

impl Bet {
    /// Whether settlement has happened.
    pub fn is_settled(&self) -> bool {
        self.status != BetStatus::Pending
    }

    /// Win flag; `None` until settled.
    pub fn is_won(&self) -> Option<bool> {
        match self.status {
            BetStatus::Pending => None,
            BetStatus::Won => Some(true),
            BetStatus::Lost => Some(false),
        }
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
