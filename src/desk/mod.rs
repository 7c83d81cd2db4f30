//! Betting Desk
//!
//! Owns the registry, the ledger, the treasury and the journal, and keeps
//! them consistent: every successful mutation is journaled and logged, and
//! settlement payouts land in the treasury.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           DESK                               │
//! ├──────────────────────────────────────────────────────────────┤
//! │  MatchRegistry ─┐                                            │
//! │  BetLedger ─────┼──► settle_match ──► Treasury.credit        │
//! │  Treasury ──────┘          │                                 │
//! │  Journal  ◄────────────────┴── one DeskEvent per change      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod events;
pub mod service;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, Oracle};
use crate::codec::{CodecError, ConfidentialValue, EncryptionKey, SealedOdds, SealedScores};
use crate::config::DeskConfig;
use crate::core::units::Units;
use crate::ledger::{BetId, BetLedger, BetType, BettorId, LedgerError, Treasury, TreasuryError};
use crate::registry::{FinalScore, MatchId, MatchRegistry, MatchStatus, RegistryError};
use crate::settlement::{settle_match, Disposition, SettlementError, SettlementReport};
use crate::view::{BetView, MatchView};

pub use events::{DeskEvent, DeskEventData, Journal, JournalError};
pub use service::SharedDesk;

/// Any error the desk can return.
#[derive(Debug, Error)]
pub enum DeskError {
    /// Codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Registry rejected the call.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Ledger rejected the call.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Treasury rejected the call.
    #[error(transparent)]
    Treasury(#[from] TreasuryError),
    /// Settlement aborted.
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    /// Caller not authorized.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Journal could not record.
    #[error(transparent)]
    Journal(#[from] JournalError),
    /// Blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

/// The betting desk.
#[derive(Debug)]
pub struct Desk {
    config: DeskConfig,
    key: EncryptionKey,
    registry: MatchRegistry,
    ledger: BetLedger,
    treasury: Treasury,
    journal: Journal,
}

impl Desk {
    /// Create an empty desk sealing to `key`.
    pub fn new(config: DeskConfig, key: EncryptionKey) -> Self {
        let ledger = BetLedger::with_cutoff(config.bet_cutoff);
        Self {
            config,
            key,
            registry: MatchRegistry::new(),
            ledger,
            treasury: Treasury::new(),
            journal: Journal::new(),
        }
    }

    // =========================================================================
    // MATCHES
    // =========================================================================

    /// Register a match.
    pub fn create_match(
        &mut self,
        home_team: &str,
        away_team: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        odds: SealedOdds,
        now: DateTime<Utc>,
    ) -> Result<MatchId, DeskError> {
        let id = self.registry.create_match(home_team, away_team, start_time, end_time, odds)?;
        let record = self.registry.get_match(id)?;
        info!(match_id = %id, home = %record.home_team, away = %record.away_team, "match created");
        self.journal.record(now, DeskEventData::MatchCreated {
            match_id: id,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            start_time,
            end_time,
        })?;
        Ok(id)
    }

    /// Move a match along its lifecycle.
    pub fn transition_status(
        &mut self,
        id: MatchId,
        next: MatchStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DeskError> {
        let from = self.registry.transition_status(id, next)?;
        info!(match_id = %id, %from, to = %next, "status changed");
        self.journal.record(now, DeskEventData::StatusChanged { match_id: id, from, to: next })?;
        Ok(())
    }

    /// Attach the sealed final score.
    pub fn publish_result(
        &mut self,
        id: MatchId,
        scores: SealedScores,
        now: DateTime<Utc>,
    ) -> Result<(), DeskError> {
        let home = scores.home.fingerprint();
        let away = scores.away.fingerprint();
        self.registry.publish_result(id, scores)?;
        info!(match_id = %id, %home, %away, "result published");
        self.journal.record(now, DeskEventData::ResultPublished { match_id: id, home, away })?;
        Ok(())
    }

    // =========================================================================
    // BETS
    // =========================================================================

    /// Record a wager.
    pub fn place_bet(
        &mut self,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
        now: DateTime<Utc>,
    ) -> Result<BetId, DeskError> {
        self.admit_bet(match_id, bet_type, amount, bettor, now, true)
    }

    /// Record a wager whose amount proof the caller already checked.
    pub(crate) fn place_verified_bet(
        &mut self,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
        now: DateTime<Utc>,
    ) -> Result<BetId, DeskError> {
        self.admit_bet(match_id, bet_type, amount, bettor, now, false)
    }

    fn admit_bet(
        &mut self,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
        now: DateTime<Utc>,
        check_proof: bool,
    ) -> Result<BetId, DeskError> {
        let fingerprint = amount.fingerprint();
        let placed = if check_proof {
            self.ledger.place_bet(&self.registry, match_id, bet_type, amount, bettor, now)
        } else {
            self.ledger.place_verified_bet(&self.registry, match_id, bet_type, amount, bettor, now)
        };
        let bet_id = placed.inspect_err(|e| debug!(%match_id, %bettor, error = %e, "bet rejected"))?;
        info!(%bet_id, %match_id, %bettor, %bet_type, "bet placed");
        self.journal.record(now, DeskEventData::BetPlaced {
            bet_id,
            match_id,
            bettor,
            bet_type,
            amount: fingerprint,
        })?;
        Ok(bet_id)
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    /// Settle a finished match against `score` and credit the winners.
    pub fn settle(
        &mut self,
        match_id: MatchId,
        score: FinalScore,
        oracle: &Oracle<'_>,
        now: DateTime<Utc>,
    ) -> Result<SettlementReport, DeskError> {
        let report = settle_match(&self.registry, &mut self.ledger, match_id, score, oracle)?;

        for entry in &report.entries {
            if let Disposition::Settled { is_won, .. } = entry.disposition {
                self.journal.record(now, DeskEventData::BetSettled { bet_id: entry.bet_id, is_won })?;
            }
        }
        for (bet_id, bettor, payout) in report.winners() {
            match self.treasury.credit(bettor, payout) {
                Ok(_) => {
                    self.journal.record(now, DeskEventData::PayoutCredited { bet_id, bettor })?;
                }
                Err(e) => {
                    warn!(%bet_id, %bettor, error = %e, "payout not credited");
                    self.journal.record(now, DeskEventData::PayoutFailed {
                        bet_id,
                        bettor,
                        reason: e.to_string(),
                    })?;
                }
            }
        }
        for (bet_id, bettor) in report.unpaid() {
            self.journal.record(now, DeskEventData::PayoutFailed {
                bet_id,
                bettor,
                reason: "payout could not be computed".to_string(),
            })?;
        }

        info!(
            %match_id,
            outcome = %report.outcome,
            settled = report.settled(),
            skipped = report.skipped(),
            failed = report.failed(),
            "match settled"
        );
        Ok(report)
    }

    /// Reveal the published score of a finished match, then settle it.
    pub fn settle_published(
        &mut self,
        match_id: MatchId,
        oracle: &Oracle<'_>,
        now: DateTime<Utc>,
    ) -> Result<SettlementReport, DeskError> {
        let already_revealed = self.registry.get_match(match_id)?.revealed_score().is_some();
        let score = self.registry.reveal_scores(match_id, oracle)?;
        if !already_revealed {
            info!(%match_id, %score, "scores revealed");
            self.journal.record(now, DeskEventData::ScoresRevealed { match_id, score })?;
        }
        self.settle(match_id, score, oracle, now)
    }

    // =========================================================================
    // TREASURY
    // =========================================================================

    /// Privileged balance read.
    pub fn balance(&self, bettor: &BettorId, oracle: &Oracle<'_>) -> Units {
        self.treasury.balance(bettor, oracle)
    }

    /// Withdraw a sealed amount from a wallet balance.
    pub fn withdraw(
        &mut self,
        bettor: BettorId,
        amount: &ConfidentialValue,
        oracle: &Oracle<'_>,
        now: DateTime<Utc>,
    ) -> Result<Units, DeskError> {
        let withdrawn = self.treasury.withdraw(bettor, amount, oracle)?;
        info!(%bettor, amount = %amount.fingerprint(), "withdrawal");
        self.journal.record(now, DeskEventData::Withdrawal { bettor, amount: amount.fingerprint() })?;
        Ok(withdrawn)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Public views of every match.
    pub fn match_views(&self) -> Vec<MatchView> {
        self.registry.matches().map(MatchView::redacted).collect()
    }

    /// Public views of a wallet's bets.
    pub fn bet_views(&self, bettor: &BettorId) -> Vec<BetView> {
        self.ledger.list_bets_by_bettor(bettor).into_iter().map(BetView::redacted).collect()
    }

    /// Registry.
    pub fn registry(&self) -> &MatchRegistry {
        &self.registry
    }

    /// Ledger.
    pub fn ledger(&self) -> &BetLedger {
        &self.ledger
    }

    /// Journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Key values are sealed to.
    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.key
    }

    /// Configuration.
    pub fn config(&self) -> &DeskConfig {
        &self.config
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::codec::keys::{derive_from_seed, DecryptionKey};
    use crate::codec::{encrypt, encrypt_odds, encrypt_scores, Odds};

    fn units(value: f64) -> Units {
        Units::from_decimal(value).unwrap()
    }

    fn desk() -> (Desk, DecryptionKey) {
        let (enc, dec) = derive_from_seed(&[61; 32]);
        (Desk::new(DeskConfig::default(), enc), dec)
    }

    fn open_match(desk: &mut Desk, t0: DateTime<Utc>) -> MatchId {
        let odds = encrypt_odds(
            Odds { home: units(1.9), draw: units(3.4), away: units(4.2) },
            desk.encryption_key(),
        )
        .unwrap();
        desk.create_match("Lions", "Tigers", t0, t0 + Duration::hours(2), odds, t0).unwrap()
    }

    #[test]
    fn test_full_flow_credits_winner() {
        let (mut desk, dec) = desk();
        let oracle = Oracle::from_key(&dec);
        let t0 = Utc::now();
        let id = open_match(&mut desk, t0);
        let alice = BettorId::new([0xa1; 20]);
        let bob = BettorId::new([0xb0; 20]);

        let stake = encrypt(units(100.0), desk.encryption_key()).unwrap();
        desk.place_bet(id, BetType::HomeWin, stake, alice, t0).unwrap();
        let stake = encrypt(units(40.0), desk.encryption_key()).unwrap();
        desk.place_bet(id, BetType::AwayWin, stake, bob, t0).unwrap();

        desk.transition_status(id, MatchStatus::Live, t0).unwrap();
        let scores = encrypt_scores(
            Units::from_whole(2).unwrap(),
            Units::from_whole(1).unwrap(),
            desk.encryption_key(),
        )
        .unwrap();
        desk.publish_result(id, scores, t0).unwrap();
        desk.transition_status(id, MatchStatus::Finished, t0).unwrap();

        let report = desk.settle_published(id, &oracle, t0).unwrap();
        assert_eq!(report.settled(), 2);
        assert_eq!(desk.balance(&alice, &oracle), units(190.0));
        assert_eq!(desk.balance(&bob, &oracle), Units::ZERO);

        // Re-run journals nothing and credits nothing
        let journal_len = desk.journal().len();
        let again = desk.settle_published(id, &oracle, t0).unwrap();
        assert_eq!(again.skipped(), 2);
        assert_eq!(desk.journal().len(), journal_len);
        assert_eq!(desk.balance(&alice, &oracle), units(190.0));

        assert!(desk.journal().verify_chain().is_ok());
    }

    #[test]
    fn test_rejected_calls_leave_no_trace() {
        let (mut desk, _) = desk();
        let t0 = Utc::now();
        let id = open_match(&mut desk, t0);
        desk.transition_status(id, MatchStatus::Cancelled, t0).unwrap();
        let before = desk.journal().len();

        let stake = encrypt(units(5.0), desk.encryption_key()).unwrap();
        let result = desk.place_bet(id, BetType::Draw, stake, BettorId::default(), t0);
        assert!(matches!(result, Err(DeskError::Ledger(LedgerError::MatchNotBettable { .. }))));
        assert!(matches!(
            desk.transition_status(id, MatchStatus::Live, t0),
            Err(DeskError::Registry(RegistryError::InvalidTransition { .. }))
        ));
        assert_eq!(desk.journal().len(), before);
    }

    fn finished_match(
        desk: &mut Desk,
        t0: DateTime<Utc>,
        bets: Vec<(ConfidentialValue, BettorId)>,
    ) -> MatchId {
        let odds = encrypt_odds(
            Odds { home: units(2.0), draw: units(3.0), away: units(3.0) },
            desk.encryption_key(),
        )
        .unwrap();
        let id = desk.create_match("Hawks", "Owls", t0, t0 + Duration::hours(2), odds, t0).unwrap();
        for (amount, bettor) in bets {
            desk.place_bet(id, BetType::HomeWin, amount, bettor, t0).unwrap();
        }
        desk.transition_status(id, MatchStatus::Live, t0).unwrap();
        let scores = encrypt_scores(Units::from_whole(1).unwrap(), Units::ZERO, desk.encryption_key()).unwrap();
        desk.publish_result(id, scores, t0).unwrap();
        desk.transition_status(id, MatchStatus::Finished, t0).unwrap();
        id
    }

    #[test]
    fn test_large_payouts_accumulate() {
        let (mut desk, dec) = desk();
        let oracle = Oracle::from_key(&dec);
        let t0 = Utc::now();
        let dave = BettorId::new([0xd0; 20]);

        let stake = encrypt(Units::from_whole(450_000_000).unwrap(), desk.encryption_key()).unwrap();
        let first = finished_match(&mut desk, t0, vec![(stake, dave)]);
        desk.settle_published(first, &oracle, t0).unwrap();
        let stake = encrypt(Units::from_whole(100_000_000).unwrap(), desk.encryption_key()).unwrap();
        let second = finished_match(&mut desk, t0, vec![(stake, dave)]);
        let report = desk.settle_published(second, &oracle, t0).unwrap();

        assert_eq!(report.total_payout(), Units::from_whole(200_000_000).unwrap());
        assert_eq!(desk.balance(&dave, &oracle).raw(), 1_100_000_000 * 1_000_000);
        let credited = desk
            .journal()
            .events()
            .iter()
            .filter(|e| matches!(e.data, DeskEventData::PayoutCredited { bettor, .. } if bettor == dave))
            .count();
        assert_eq!(credited, 2);
    }

    #[test]
    fn test_unpaid_winner_is_journaled() {
        let (mut desk, dec) = desk();
        let oracle = Oracle::from_key(&dec);
        let t0 = Utc::now();
        let erin = BettorId::new([0xe0; 20]);

        // Valid proof, sealed to some other oracle
        let (other, _) = derive_from_seed(&[62; 32]);
        let foreign = encrypt(units(5.0), &other).unwrap();
        let id = finished_match(&mut desk, t0, vec![(foreign, erin)]);

        let report = desk.settle_published(id, &oracle, t0).unwrap();
        assert_eq!(report.settled(), 1);
        assert_eq!(desk.ledger().bets()[0].is_won(), Some(true));
        assert_eq!(desk.balance(&erin, &oracle), Units::ZERO);
        assert!(matches!(
            desk.journal().events().last().map(|e| &e.data),
            Some(DeskEventData::PayoutFailed { bettor, .. }) if *bettor == erin
        ));
        assert!(desk.journal().verify_chain().is_ok());
    }

    #[test]
    fn test_withdraw_after_payout() {
        let (mut desk, dec) = desk();
        let oracle = Oracle::from_key(&dec);
        let t0 = Utc::now();
        let id = open_match(&mut desk, t0);
        let carol = BettorId::new([0xc0; 20]);

        let stake = encrypt(units(10.0), desk.encryption_key()).unwrap();
        desk.place_bet(id, BetType::Draw, stake, carol, t0).unwrap();
        desk.transition_status(id, MatchStatus::Live, t0).unwrap();
        let scores = encrypt_scores(Units::ZERO, Units::ZERO, desk.encryption_key()).unwrap();
        desk.publish_result(id, scores, t0).unwrap();
        desk.transition_status(id, MatchStatus::Finished, t0).unwrap();
        desk.settle_published(id, &oracle, t0).unwrap();
        assert_eq!(desk.balance(&carol, &oracle), units(34.0));

        let amount = encrypt(units(30.0), desk.encryption_key()).unwrap();
        assert_eq!(desk.withdraw(carol, &amount, &oracle, t0).unwrap(), units(30.0));
        assert_eq!(desk.balance(&carol, &oracle), units(4.0));

        let too_much = encrypt(units(5.0), desk.encryption_key()).unwrap();
        assert!(matches!(
            desk.withdraw(carol, &too_much, &oracle, t0),
            Err(DeskError::Treasury(TreasuryError::InsufficientFunds { .. }))
        ));
    }

    #[test]
    fn test_views_are_redacted() {
        let (mut desk, _) = desk();
        let t0 = Utc::now();
        let id = open_match(&mut desk, t0);
        let dave = BettorId::new([0xd0; 20]);
        let stake = encrypt(units(77.5), desk.encryption_key()).unwrap();
        desk.place_bet(id, BetType::AwayWin, stake, dave, t0).unwrap();

        let json = serde_json::to_string(&(desk.match_views(), desk.bet_views(&dave))).unwrap();
        assert!(!json.contains("77.5"));
        assert_eq!(desk.bet_views(&dave).len(), 1);
    }
}
