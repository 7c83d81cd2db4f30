//! Settlement Engine
//!
//! Walks every bet on a finished match once, in placement order, and flips
//! its settlement flag. Win or loss depends on the outcome alone; a payout
//! that cannot be computed is reported next to the flag and never blocks it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Oracle;
use crate::codec::{CodecError, ConfidentialValue};
use crate::core::units::Units;
use crate::ledger::{BetId, BetLedger, BettorId, LedgerError};
use crate::registry::{FinalScore, MatchId, MatchRegistry, MatchStatus, Outcome};

/// Settlement errors. Only match-level faults abort a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    /// No match with this id.
    #[error("{0} not found")]
    NotFound(MatchId),

    /// Match has not finished.
    #[error("{id} is {status}, only finished matches settle")]
    MatchNotFinished {
        /// Match.
        id: MatchId,
        /// Current status.
        status: MatchStatus,
    },

    /// Odds could not be opened.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// What happened to one bet during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// Flag written in this run.
    Settled {
        /// Backed the outcome.
        is_won: bool,
        /// Stake times odds for winners, zero for losers. `None` when the
        /// stake cannot be opened or the product overflows.
        payout: Option<Units>,
    },
    /// Settled by an earlier run.
    Skipped,
    /// Ledger refused the write; left pending.
    Failed(String),
}

/// Per-bet line of a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetSettlement {
    /// Bet.
    pub bet_id: BetId,
    /// Wallet to credit.
    pub bettor: BettorId,
    /// Result for this bet.
    pub disposition: Disposition,
}

/// Result of one settlement run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    /// Match.
    pub match_id: MatchId,
    /// Score the run settled against.
    pub score: FinalScore,
    /// Outcome derived from the score.
    pub outcome: Outcome,
    /// One entry per bet, in placement order.
    pub entries: Vec<BetSettlement>,
}

impl SettlementReport {
    /// Bets settled in this run.
    pub fn settled(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.disposition, Disposition::Settled { .. }))
            .count()
    }

    /// Bets already settled before this run.
    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|e| e.disposition == Disposition::Skipped).count()
    }

    /// Bets left pending by a fault.
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.disposition, Disposition::Failed(_)))
            .count()
    }

    /// Winning bets settled in this run, with their payout.
    pub fn winners(&self) -> impl Iterator<Item = (BetId, BettorId, Units)> + '_ {
        self.entries.iter().filter_map(|e| match e.disposition {
            Disposition::Settled { is_won: true, payout: Some(payout) } => {
                Some((e.bet_id, e.bettor, payout))
            }
            _ => None,
        })
    }

    /// Winning bets settled in this run whose payout could not be computed.
    pub fn unpaid(&self) -> impl Iterator<Item = (BetId, BettorId)> + '_ {
        self.entries.iter().filter_map(|e| match e.disposition {
            Disposition::Settled { is_won: true, payout: None } => Some((e.bet_id, e.bettor)),
            _ => None,
        })
    }

    /// Sum of payouts settled in this run.
    pub fn total_payout(&self) -> Units {
        self.winners().fold(Units::ZERO, |acc, (_, _, payout)| acc + payout)
    }
}

/// Settle every pending bet on a finished match.
///
/// Re-running is safe: bets settled earlier come back as [`Disposition::Skipped`].
pub fn settle_match(
    registry: &MatchRegistry,
    ledger: &mut BetLedger,
    match_id: MatchId,
    score: FinalScore,
    oracle: &Oracle<'_>,
) -> Result<SettlementReport, SettlementError> {
    let record = registry
        .get_match(match_id)
        .map_err(|_| SettlementError::NotFound(match_id))?;
    if record.status != MatchStatus::Finished {
        return Err(SettlementError::MatchNotFinished { id: match_id, status: record.status });
    }

    let outcome = score.outcome();
    let odds = oracle.decrypt_odds(&record.odds)?;

    // Snapshot first; the ledger is mutated below
    let pending: Vec<_> = ledger
        .list_bets_by_match(match_id)
        .into_iter()
        .map(|bet| (bet.id, bet.bettor, bet.bet_type, bet.is_settled(), bet.amount.clone()))
        .collect();

    let mut entries = Vec::with_capacity(pending.len());
    for (bet_id, bettor, bet_type, settled, amount) in pending {
        let disposition = if settled {
            Disposition::Skipped
        } else {
            let is_won = bet_type == outcome;
            match ledger.mark_settled(bet_id, is_won) {
                Ok(()) => {
                    let payout = if is_won {
                        winning_payout(oracle, &amount, odds.for_outcome(bet_type))
                            .inspect_err(|reason| warn!(%bet_id, %reason, "payout unavailable"))
                            .ok()
                    } else {
                        Some(Units::ZERO)
                    };
                    debug!(%bet_id, is_won, ?payout, "bet settled");
                    Disposition::Settled { is_won, payout }
                }
                Err(LedgerError::AlreadySettled(_)) => Disposition::Skipped,
                Err(e) => {
                    warn!(%bet_id, error = %e, "bet left pending");
                    Disposition::Failed(e.to_string())
                }
            }
        };
        entries.push(BetSettlement { bet_id, bettor, disposition });
    }

    Ok(SettlementReport { match_id, score, outcome, entries })
}

/// `stake × odds` for a winning bet.
fn winning_payout(oracle: &Oracle<'_>, amount: &ConfidentialValue, odds: Units) -> Result<Units, String> {
    let stake = oracle.decrypt(amount).map_err(|e| e.to_string())?;
    stake
        .checked_mul(odds)
        .ok_or_else(|| format!("{stake} × {odds} overflows"))
}

// =============================================================================
// TESTS
// =============================================================================
