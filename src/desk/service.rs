//! Shared Desk Service
//!
//! Async front for a [`Desk`] shared between tasks. Each mutating call holds
//! the write lock for its whole check-then-write, so callers racing on the
//! same match observe one consistent order. Codec work runs on the blocking
//! pool before the lock is taken and is not repeated under it.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::auth::{authorize_oracle, Oracle};
use crate::codec::{self, ConfidentialValue, DecryptionKey, EncryptionKey, SealedOdds, SealedScores};
use crate::core::units::Units;
use crate::desk::{Desk, DeskError, Journal};
use crate::ledger::{BetId, BetType, BettorId, LedgerError};
use crate::registry::{MatchId, MatchStatus, RegistryError};
use crate::settlement::SettlementReport;
use crate::view::{BetView, MatchView};

/// Cloneable handle to a desk behind an async lock.
#[derive(Clone)]
pub struct SharedDesk {
    inner: Arc<RwLock<Desk>>,
    key: EncryptionKey,
}

impl SharedDesk {
    /// Wrap a desk.
    pub fn new(desk: Desk) -> Self {
        let key = desk.encryption_key().clone();
        Self { inner: Arc::new(RwLock::new(desk)), key }
    }

    /// The underlying lock, for callers batching several operations.
    pub fn desk(&self) -> Arc<RwLock<Desk>> {
        Arc::clone(&self.inner)
    }

    /// Seal a value to the desk key.
    pub async fn seal(&self, value: Units) -> Result<ConfidentialValue, DeskError> {
        let key = self.key.clone();
        blocking(move || codec::encrypt(value, &key).map_err(DeskError::from)).await
    }

    /// Register a match.
    #[instrument(skip(self, odds))]
    pub async fn create_match(
        &self,
        home_team: String,
        away_team: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        odds: SealedOdds,
    ) -> Result<MatchId, DeskError> {
        let odds = blocking(move || {
            if odds.verify() {
                Ok(odds)
            } else {
                Err(DeskError::Registry(RegistryError::InvalidProof("odds")))
            }
        })
        .await?;
        let mut desk = self.inner.write().await;
        desk.create_match(&home_team, &away_team, start_time, end_time, odds, Utc::now())
    }

    /// Move a match along its lifecycle.
    #[instrument(skip(self))]
    pub async fn transition_status(&self, id: MatchId, next: MatchStatus) -> Result<(), DeskError> {
        let mut desk = self.inner.write().await;
        desk.transition_status(id, next, Utc::now())
    }

    /// Attach the sealed final score.
    #[instrument(skip(self, scores))]
    pub async fn publish_result(&self, id: MatchId, scores: SealedScores) -> Result<(), DeskError> {
        let scores = blocking(move || {
            if scores.verify() {
                Ok(scores)
            } else {
                Err(DeskError::Registry(RegistryError::InvalidProof("scores")))
            }
        })
        .await?;
        let mut desk = self.inner.write().await;
        desk.publish_result(id, scores, Utc::now())
    }

    /// Record a wager.
    #[instrument(skip(self, amount))]
    pub async fn place_bet(
        &self,
        match_id: MatchId,
        bet_type: BetType,
        amount: ConfidentialValue,
        bettor: BettorId,
    ) -> Result<BetId, DeskError> {
        let amount = blocking(move || {
            if codec::verify(&amount) {
                Ok(amount)
            } else {
                Err(DeskError::Ledger(LedgerError::InvalidProof))
            }
        })
        .await?;
        let mut desk = self.inner.write().await;
        desk.place_verified_bet(match_id, bet_type, amount, bettor, Utc::now())
    }

    /// Reveal and settle as the holder of the oracle key.
    #[instrument(skip(self, key))]
    pub async fn settle_published(
        &self,
        match_id: MatchId,
        key: &DecryptionKey,
    ) -> Result<SettlementReport, DeskError> {
        let desk = Arc::clone(&self.inner);
        let key = key.clone();
        blocking(move || {
            let oracle = Oracle::from_key(&key);
            desk.blocking_write().settle_published(match_id, &oracle, Utc::now())
        })
        .await
    }

    /// Reveal and settle on behalf of a caller presenting an oracle or admin JWT.
    #[instrument(skip(self, token, key))]
    pub async fn settle_published_as(
        &self,
        match_id: MatchId,
        token: &str,
        key: &DecryptionKey,
    ) -> Result<SettlementReport, DeskError> {
        let desk = Arc::clone(&self.inner);
        let token = token.to_string();
        let key = key.clone();
        blocking(move || {
            let mut desk = desk.blocking_write();
            let auth = desk.config().auth.clone();
            let oracle = authorize_oracle(&token, &auth, &key)?;
            desk.settle_published(match_id, &oracle, Utc::now())
        })
        .await
    }

    /// Privileged balance read.
    pub async fn balance(&self, bettor: BettorId, key: &DecryptionKey) -> Units {
        let desk = self.inner.read().await;
        desk.balance(&bettor, &Oracle::from_key(key))
    }

    /// Public views of every match.
    pub async fn match_views(&self) -> Vec<MatchView> {
        self.inner.read().await.match_views()
    }

    /// Public views of a wallet's bets.
    pub async fn bet_views(&self, bettor: BettorId) -> Vec<BetView> {
        self.inner.read().await.bet_views(&bettor)
    }

    /// Snapshot of the journal.
    pub async fn journal(&self) -> Journal {
        self.inner.read().await.journal().clone()
    }
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, DeskError>
where
    F: FnOnce() -> Result<T, DeskError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DeskError::Task(e.to_string()))?
}
