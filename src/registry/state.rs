//! Match Records
//!
//! Match, lifecycle status and the three-way outcome.
//! Uses BTreeMap-friendly ids so iteration follows creation order.

use std::fmt;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Deserialize};

use crate::codec::{Odds, SealedOdds, SealedScores};
use crate::core::units::Units;

// =============================================================================
// MATCH ID
// =============================================================================

/// Match identifier, assigned monotonically from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match#{}", self.0)
    }
}

// =============================================================================
// MATCH STATUS
// =============================================================================

/// Match lifecycle.
///
/// ```text
/// Upcoming --start--> Live --finish--> Finished
///     └──────cancel────┴──────────────> Cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MatchStatus {
    /// Scheduled, not started.
    Upcoming = 0,
    /// In play.
    Live = 1,
    /// Final whistle. Terminal.
    Finished = 2,
    /// Called off. Terminal.
    Cancelled = 3,
}

impl MatchStatus {
    /// Wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get status from wire code (0-3).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MatchStatus::Upcoming),
            1 => Some(MatchStatus::Live),
            2 => Some(MatchStatus::Finished),
            3 => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "Upcoming",
            MatchStatus::Live => "Live",
            MatchStatus::Finished => "Finished",
            MatchStatus::Cancelled => "Cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }

    /// Statuses that accept new bets.
    pub fn is_active(self) -> bool {
        matches!(self, MatchStatus::Upcoming | MatchStatus::Live)
    }

    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Upcoming, MatchStatus::Live)
                | (MatchStatus::Live, MatchStatus::Finished)
                | (MatchStatus::Upcoming, MatchStatus::Cancelled)
                | (MatchStatus::Live, MatchStatus::Cancelled)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Three-way result. Bets pick one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Outcome {
    /// Home side scored more.
    HomeWin = 0,
    /// Level scores.
    Draw = 1,
    /// Away side scored more.
    AwayWin = 2,
}

impl Outcome {
    /// Wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get outcome from wire code (0-2).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Outcome::HomeWin),
            1 => Some(Outcome::Draw),
            2 => Some(Outcome::AwayWin),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::HomeWin => "Home Win",
            Outcome::Draw => "Draw",
            Outcome::AwayWin => "Away Win",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Odds {
    /// Decimal odds paid for `outcome`.
    pub fn for_outcome(&self, outcome: Outcome) -> Units {
        match outcome {
            Outcome::HomeWin => self.home,
            Outcome::Draw => self.draw,
            Outcome::AwayWin => self.away,
        }
    }
}

// =============================================================================
// SCORES
// =============================================================================

/// Decrypted final score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Home goals.
    pub home: u64,
    /// Away goals.
    pub away: u64,
}

impl FinalScore {
    /// Create a score.
    pub const fn new(home: u64, away: u64) -> Self {
        Self { home, away }
    }

    /// From decrypted payloads. Scores must be whole numbers.
    pub fn from_units(home: Units, away: Units) -> Option<Self> {
        Some(Self::new(home.as_whole()?, away.as_whole()?))
    }

    /// Outcome implied by the score.
    pub fn outcome(&self) -> Outcome {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.home, self.away)
    }
}

/// Score slot of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBoard {
    /// Nothing published yet.
    Pending,
    /// Encrypted result attached.
    Sealed(SealedScores),
    /// Result opened by the oracle after the match finished.
    Revealed {
        /// Published ciphertexts, kept for audit.
        sealed: SealedScores,
        /// Decrypted score.
        score: FinalScore,
    },
}

// =============================================================================
// MATCH
// =============================================================================

/// A match record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Identifier.
    pub id: MatchId,
    /// Home side name.
    pub home_team: String,
    /// Away side name.
    pub away_team: String,
    /// Kick-off.
    pub start_time: DateTime<Utc>,
    /// Scheduled end; betting closes here.
    pub end_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Sealed decimal odds.
    pub odds: SealedOdds,
    /// Result slot.
    pub scores: ScoreBoard,
}

impl Match {
    /// Upcoming or live.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether a bet placed at `now` is accepted.
    ///
    /// Bets close `cutoff` before `end_time`.
    pub fn accepts_bets(&self, now: DateTime<Utc>, cutoff: Duration) -> bool {
        self.status.is_active() && now < self.end_time - cutoff
    }

    /// Published ciphertexts, sealed or revealed.
    pub fn sealed_scores(&self) -> Option<&SealedScores> {
        match &self.scores {
            ScoreBoard::Pending => None,
            ScoreBoard::Sealed(sealed) | ScoreBoard::Revealed { sealed, .. } => Some(sealed),
        }
    }

    /// Decrypted score, once revealed.
    pub fn revealed_score(&self) -> Option<FinalScore> {
        match &self.scores {
            ScoreBoard::Revealed { score, .. } => Some(*score),
            _ => None,
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

// =============================================================================
// TESTS
// =============================================================================
