//! Bet Ledger
//!
//! Append-only store of bets. Bets are never removed; the only mutation is
//! the one-shot settlement flag.

use std::collections::BTreeMap;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::codec::{self, ConfidentialValue};
use crate::ledger::bet::{Bet, BetId, BetStatus, BetType, BettorId};
use crate::registry::{MatchId, MatchRegistry, MatchStatus};

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Referenced match does not exist.
    #[error("{0} not found")]
    MatchNotFound(MatchId),

    /// No bet with this id.
    #[error("{0} not found")]
    BetNotFound(BetId),

    /// Match is closed for betting.
    #[error("{id} is not accepting bets ({status}, {reason})")]
    MatchNotBettable {
        /// Match.
        id: MatchId,
        /// Status at placement time.
        status: MatchStatus,
        /// Why it is closed.
        reason: &'static str,
    },

    /// Amount proof does not verify.
    #[error("amount failed proof verification")]
    InvalidProof,

    /// Bet was settled before.
    #[error("{0} is already settled")]
    AlreadySettled(BetId),
}

/// Append-only bet store with match and bettor indexes.
#[derive(Debug)]
pub struct BetLedger {
    bets: Vec<Bet>,
    by_match: BTreeMap<MatchId, Vec<usize>>,
    by_bettor: BTreeMap<BettorId, Vec<usize>>,
    cutoff: Duration,
}

impl Default for BetLedger {
    fn default() -> Self {
        Self::with_cutoff(Duration::zero())
    }
}

impl BetLedger {
    /// Create an empty ledger. Bets close at the scheduled end.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ledger that closes betting `cutoff` before the end.
    pub fn with_cutoff(cutoff: Duration) -> Self {
        Self {
            bets: Vec::new(),
            by_match: BTreeMap::new(),
            by_bettor: BTreeMap::new(),
            cutoff,
        }
    }

    /// Record a wager.
    ///
    /// Checks run in order: match exists, match open, amount proof.
    pub fn place_bet(
        &mut self,
        registry: &MatchRegistry,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
        now: DateTime<Utc>,
    ) -> Result<BetId, LedgerError> {
        self.check_open(registry, match_id, now)?;
        if !codec::verify(&amount) {
            return Err(LedgerError::InvalidProof);
        }
        Ok(self.append(match_id, bet_type, amount, bettor, now))
    }

    /// Record a wager whose amount proof was checked before the call.
    pub(crate) fn place_verified_bet(
        &mut self,
        registry: &MatchRegistry,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
        now: DateTime<Utc>,
    ) -> Result<BetId, LedgerError> {
        self.check_open(registry, match_id, now)?;
        Ok(self.append(match_id, bet_type, amount, bettor, now))
    }

    fn check_open(&self, registry: &MatchRegistry, match_id: MatchId, now: DateTime<Utc>) -> Result<(), LedgerError> {
        let record = registry
            .get_match(match_id)
            .map_err(|_| LedgerError::MatchNotFound(match_id))?;

        if !record.status.is_active() {
            return Err(LedgerError::MatchNotBettable {
                id: match_id,
                status: record.status,
                reason: "match is closed",
            });
        }
        if !record.accepts_bets(now, self.cutoff) {
            return Err(LedgerError::MatchNotBettable {
                id: match_id,
                status: record.status,
                reason: "betting window has ended",
            });
        }
        Ok(())
    }

    fn append(
        &mut self,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
        now: DateTime<Utc>,
    ) -> BetId {
        let index = self.bets.len();
        let id = BetId(index as u64 + 1);
        self.bets.push(Bet {
            id,
            match_id,
            amount,
            bet_type,
            bettor,
            placed_at: now,
            status: BetStatus::Pending,
        });
        self.by_match.entry(match_id).or_default().push(index);
        self.by_bettor.entry(bettor).or_default().push(index);
        id
    }

    /// Bets on a match, in placement order.
    pub fn list_bets_by_match(&self, match_id: MatchId) -> Vec<&Bet> {
        self.collect(self.by_match.get(&match_id))
    }

    /// Bets by a wallet, in placement order.
    pub fn list_bets_by_bettor(&self, bettor: &BettorId) -> Vec<&Bet> {
        self.collect(self.by_bettor.get(bettor))
    }

    /// Get a bet.
    pub fn get_bet(&self, id: BetId) -> Result<&Bet, LedgerError> {
        self.index_of(id)
            .and_then(|i| self.bets.get(i))
            .ok_or(LedgerError::BetNotFound(id))
    }

    /// Settle a bet exactly once.
    pub fn mark_settled(&mut self, id: BetId, is_won: bool) -> Result<(), LedgerError> {
        let bet = self
            .index_of(id)
            .and_then(|i| self.bets.get_mut(i))
            .ok_or(LedgerError::BetNotFound(id))?;
        if bet.is_settled() {
            return Err(LedgerError::AlreadySettled(id));
        }
        bet.status = if is_won { BetStatus::Won } else { BetStatus::Lost };
        Ok(())
    }

    /// All bets in placement order.
    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    /// Number of bets.
    pub fn len(&self) -> usize {
        self.bets.len()
    }

    /// Whether no bet was placed yet.
    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    fn index_of(&self, id: BetId) -> Option<usize> {
        (id.0 as usize).checked_sub(1)
    }

    fn collect(&self, indexes: Option<&Vec<usize>>) -> Vec<&Bet> {
        indexes
            .map(|idx| idx.iter().filter_map(|i| self.bets.get(*i)).collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// TESTS
// =============================================================================
