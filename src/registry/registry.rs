//! Match Registry
//!
//! Owns match records. Every mutation goes through here and enforces the
//! forward-only lifecycle.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::Oracle;
use crate::codec::{CodecError, SealedOdds, SealedScores};
use crate::registry::state::{FinalScore, Match, MatchId, MatchStatus, ScoreBoard};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No match with this id.
    #[error("{0} not found")]
    NotFound(MatchId),

    /// Start must be before end.
    #[error("start time {start} is not before end time {end}")]
    InvalidSchedule {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },

    /// Team names empty or identical.
    #[error("invalid teams: {0}")]
    InvalidTeams(String),

    /// A sealed value failed verification.
    #[error("sealed {0} failed proof verification")]
    InvalidProof(&'static str),

    /// Edge not in the lifecycle.
    #[error("cannot move {id} from {from} to {to}")]
    InvalidTransition {
        /// Match.
        id: MatchId,
        /// Current status.
        from: MatchStatus,
        /// Requested status.
        to: MatchStatus,
    },

    /// Finishing requires a published result.
    #[error("{0} has no published result")]
    MissingResult(MatchId),

    /// Result can no longer change.
    #[error("result of {id} is locked in status {status}")]
    ResultLocked {
        /// Match.
        id: MatchId,
        /// Current status.
        status: MatchStatus,
    },

    /// Scores open only after the final whistle.
    #[error("{id} is {status}, scores stay sealed until finished")]
    NotFinished {
        /// Match.
        id: MatchId,
        /// Current status.
        status: MatchStatus,
    },

    /// Published scores are not whole numbers.
    #[error("published scores of {0} are not whole numbers")]
    InvalidScore(MatchId),

    /// Decryption failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Owned store of matches.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: BTreeMap<MatchId, Match>,
    next_id: u64,
}

impl MatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new upcoming match.
    pub fn create_match(
        &mut self,
        home_team: &str,
        away_team: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        odds: SealedOdds,
    ) -> Result<MatchId, RegistryError> {
        let home_team = home_team.trim();
        let away_team = away_team.trim();
        if home_team.is_empty() || away_team.is_empty() {
            return Err(RegistryError::InvalidTeams("team name is empty".into()));
        }
        if home_team.eq_ignore_ascii_case(away_team) {
            return Err(RegistryError::InvalidTeams(format!("{} cannot play itself", home_team)));
        }
        if start_time >= end_time {
            return Err(RegistryError::InvalidSchedule { start: start_time, end: end_time });
        }
        if !odds.verify() {
            return Err(RegistryError::InvalidProof("odds"));
        }

        self.next_id += 1;
        let id = MatchId(self.next_id);
        self.matches.insert(id, Match {
            id,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            start_time,
            end_time,
            status: MatchStatus::Upcoming,
            odds,
            scores: ScoreBoard::Pending,
        });
        Ok(id)
    }

    /// Move a match along its lifecycle.
    pub fn transition_status(&mut self, id: MatchId, next: MatchStatus) -> Result<MatchStatus, RegistryError> {
        let record = self.get_mut(id)?;
        let from = record.status;
        if !from.can_transition_to(next) {
            return Err(RegistryError::InvalidTransition { id, from, to: next });
        }
        if next == MatchStatus::Finished && record.sealed_scores().is_none() {
            return Err(RegistryError::MissingResult(id));
        }
        record.status = next;
        Ok(from)
    }

    /// Attach the encrypted final score.
    ///
    /// Allowed while Upcoming (walkover) or Live. A second publish before the
    /// match finishes replaces the first.
    pub fn publish_result(&mut self, id: MatchId, scores: SealedScores) -> Result<(), RegistryError> {
        let record = self.get_mut(id)?;
        if !record.status.is_active() {
            return Err(RegistryError::ResultLocked { id, status: record.status });
        }
        if !scores.verify() {
            return Err(RegistryError::InvalidProof("scores"));
        }
        record.scores = ScoreBoard::Sealed(scores);
        Ok(())
    }

    /// Open the published scores of a finished match. Idempotent.
    pub fn reveal_scores(&mut self, id: MatchId, oracle: &Oracle<'_>) -> Result<FinalScore, RegistryError> {
        let record = self.get_mut(id)?;
        if record.status != MatchStatus::Finished {
            return Err(RegistryError::NotFinished { id, status: record.status });
        }
        let sealed = match &record.scores {
            ScoreBoard::Revealed { score, .. } => return Ok(*score),
            ScoreBoard::Sealed(sealed) => sealed.clone(),
            // Finished always has a result; guarded by transition_status
            ScoreBoard::Pending => return Err(RegistryError::MissingResult(id)),
        };

        let (home, away) = oracle.decrypt_scores(&sealed)?;
        let score = FinalScore::from_units(home, away).ok_or(RegistryError::InvalidScore(id))?;
        record.scores = ScoreBoard::Revealed { sealed, score };
        Ok(score)
    }

    /// Get a match.
    pub fn get_match(&self, id: MatchId) -> Result<&Match, RegistryError> {
        self.matches.get(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Sealed odds of a match.
    pub fn odds(&self, id: MatchId) -> Result<&SealedOdds, RegistryError> {
        Ok(&self.get_match(id)?.odds)
    }

    /// All matches in creation order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values()
    }

    /// Upcoming and live matches.
    pub fn active_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values().filter(|m| m.is_active())
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    fn get_mut(&mut self, id: MatchId) -> Result<&mut Match, RegistryError> {
        self.matches.get_mut(&id).ok_or(RegistryError::NotFound(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
