//! Desk Events
//!
//! Hash-chained journal of every state change, handed to the chain layer
//! for submission. Sealed values appear as fingerprints only.
//!
//! ```text
//! genesis (0x00..) ──► e1.digest ──► e2.digest ──► ...
//! digest = SHA-256(domain ‖ seq ‖ prev ‖ at ‖ bincode(data))
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::{Digest32, RecordHasher};
use crate::ledger::{BetId, BetType, BettorId};
use crate::registry::{FinalScore, MatchId, MatchStatus};

/// Digest preceding the first event.
pub const GENESIS: Digest32 = [0u8; 32];

/// Journal errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JournalError {
    /// Event payload could not be encoded for hashing.
    #[error("cannot encode event: {0}")]
    Encoding(String),

    /// Chain link or digest mismatch.
    #[error("journal chain broken at event {seq}")]
    Broken {
        /// First bad event.
        seq: u64,
    },
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeskEventData {
    /// Match registered.
    MatchCreated {
        /// Match.
        match_id: MatchId,
        /// Home side.
        home_team: String,
        /// Away side.
        away_team: String,
        /// Kick-off.
        start_time: DateTime<Utc>,
        /// Scheduled end.
        end_time: DateTime<Utc>,
    },

    /// Lifecycle edge taken.
    StatusChanged {
        /// Match.
        match_id: MatchId,
        /// Previous status.
        from: MatchStatus,
        /// New status.
        to: MatchStatus,
    },

    /// Sealed result attached.
    ResultPublished {
        /// Match.
        match_id: MatchId,
        /// Home score fingerprint.
        home: String,
        /// Away score fingerprint.
        away: String,
    },

    /// Oracle opened the final score.
    ScoresRevealed {
        /// Match.
        match_id: MatchId,
        /// Decrypted score.
        score: FinalScore,
    },

    /// Wager recorded.
    BetPlaced {
        /// Bet.
        bet_id: BetId,
        /// Match.
        match_id: MatchId,
        /// Wallet.
        bettor: BettorId,
        /// Backed side.
        bet_type: BetType,
        /// Stake fingerprint.
        amount: String,
    },

    /// Win/loss written.
    BetSettled {
        /// Bet.
        bet_id: BetId,
        /// Win flag.
        is_won: bool,
    },

    /// Winning bet paid into the wallet balance.
    PayoutCredited {
        /// Bet.
        bet_id: BetId,
        /// Wallet.
        bettor: BettorId,
    },

    /// Winning bet settled without a credit.
    PayoutFailed {
        /// Bet.
        bet_id: BetId,
        /// Wallet.
        bettor: BettorId,
        /// Why nothing was credited.
        reason: String,
    },

    /// Funds left the treasury.
    Withdrawal {
        /// Wallet.
        bettor: BettorId,
        /// Amount fingerprint.
        amount: String,
    },
}

/// A journal entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskEvent {
    /// Position in the journal, from 1.
    pub seq: u64,
    /// When the desk applied the change.
    pub at: DateTime<Utc>,
    /// Digest of the previous entry.
    #[serde(with = "hex::serde")]
    pub prev: Digest32,
    /// Digest of this entry.
    #[serde(with = "hex::serde")]
    pub digest: Digest32,
    /// Payload.
    pub data: DeskEventData,
}

impl DeskEvent {
    /// Digest of an entry with the given header and payload.
    pub fn compute_digest(
        seq: u64,
        prev: &Digest32,
        at: DateTime<Utc>,
        data: &DeskEventData,
    ) -> Result<Digest32, JournalError> {
        let payload = bincode::serialize(data).map_err(|e| JournalError::Encoding(e.to_string()))?;
        let mut hasher = RecordHasher::for_journal();
        hasher.update_u64(seq);
        hasher.update_bytes(prev);
        hasher.update_u64(at.timestamp_micros() as u64);
        hasher.update_framed(&payload);
        Ok(hasher.finalize())
    }

    /// Whether the stored digest matches the content.
    pub fn is_intact(&self) -> bool {
        Self::compute_digest(self.seq, &self.prev, self.at, &self.data)
            .map(|d| d == self.digest)
            .unwrap_or(false)
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

/// Append-only event log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Journal {
    events: Vec<DeskEvent>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return it.
    pub fn record(&mut self, at: DateTime<Utc>, data: DeskEventData) -> Result<&DeskEvent, JournalError> {
        let seq = self.events.len() as u64 + 1;
        let prev = self.head();
        let digest = DeskEvent::compute_digest(seq, &prev, at, &data)?;
        self.events.push(DeskEvent { seq, at, prev, digest, data });
        Ok(&self.events[self.events.len() - 1])
    }

    /// Digest of the latest entry, or [`GENESIS`].
    pub fn head(&self) -> Digest32 {
        self.events.last().map(|e| e.digest).unwrap_or(GENESIS)
    }

    /// All entries in order.
    pub fn events(&self) -> &[DeskEvent] {
        &self.events
    }

    /// Entries after `seq`, for incremental submission.
    pub fn since(&self, seq: u64) -> &[DeskEvent] {
        let start = (seq as usize).min(self.events.len());
        &self.events[start..]
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check sequence numbers, links and digests from genesis.
    pub fn verify_chain(&self) -> Result<(), JournalError> {
        let mut prev = GENESIS;
        for (i, event) in self.events.iter().enumerate() {
            if event.seq != i as u64 + 1 || event.prev != prev || !event.is_intact() {
                return Err(JournalError::Broken { seq: i as u64 + 1 });
            }
            prev = event.digest;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Journal {
        let t0 = Utc::now();
        let mut journal = Journal::new();
        journal
            .record(t0, DeskEventData::StatusChanged {
                match_id: MatchId(1),
                from: MatchStatus::Upcoming,
                to: MatchStatus::Live,
            })
            .unwrap();
        journal
            .record(t0, DeskEventData::BetSettled { bet_id: BetId(1), is_won: true })
            .unwrap();
        journal
            .record(t0, DeskEventData::PayoutCredited { bet_id: BetId(1), bettor: BettorId::new([5; 20]) })
            .unwrap();
        journal
    }

    #[test]
    fn test_chain_links() {
        let journal = sample();
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.events()[0].prev, GENESIS);
        assert_eq!(journal.events()[1].prev, journal.events()[0].digest);
        assert_eq!(journal.head(), journal.events()[2].digest);
        assert!(journal.verify_chain().is_ok());
    }

    #[test]
    fn test_tampered_payload_detected() {
        let mut journal = sample();
        journal.events[1].data = DeskEventData::BetSettled { bet_id: BetId(1), is_won: false };
        assert_eq!(journal.verify_chain(), Err(JournalError::Broken { seq: 2 }));
    }

    #[test]
    fn test_removed_entry_detected() {
        let mut journal = sample();
        journal.events.remove(0);
        assert_eq!(journal.verify_chain(), Err(JournalError::Broken { seq: 1 }));
    }

    #[test]
    fn test_since() {
        let journal = sample();
        assert_eq!(journal.since(0).len(), 3);
        assert_eq!(journal.since(2)[0].seq, 3);
        assert!(journal.since(10).is_empty());
    }

    #[test]
    fn test_event_encodings() {
        let journal = sample();
        let event = &journal.events()[2];

        let bytes = event.to_bytes().unwrap();
        assert_eq!(&DeskEvent::from_bytes(&bytes).unwrap(), event);

        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["data"]["payout_credited"]["bettor"], BettorId::new([5; 20]).to_string());
        assert_eq!(json["digest"], hex::encode(event.digest));
        let back: DeskEvent = serde_json::from_value(json).unwrap();
        assert!(back.is_intact());
    }
}
