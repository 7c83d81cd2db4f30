//! Presentation Views
//!
//! JSON-friendly snapshots of matches and bets. The redacted form carries
//! ciphertext fingerprints only; the disclosed form opens the sealed fields
//! and so requires an [`Oracle`]. Published scores open only once the match
//! has finished.

use std::convert::Infallible;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Oracle;
use crate::codec::{CodecError, ConfidentialValue};
use crate::ledger::{Bet, BetStatus};
use crate::registry::{Match, MatchStatus, ScoreBoard};

/// A sealed field as shown to a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Reading {
    /// Still confidential.
    Sealed {
        /// Ciphertext fingerprint.
        fingerprint: String,
    },
    /// Opened by the oracle.
    Open {
        /// Decimal value.
        value: String,
    },
}

impl Reading {
    fn sealed(cv: &ConfidentialValue) -> Self {
        Reading::Sealed { fingerprint: cv.fingerprint() }
    }

    fn open(cv: &ConfidentialValue, oracle: &Oracle<'_>) -> Result<Self, CodecError> {
        Ok(Reading::Open { value: oracle.decrypt(cv)?.to_string() })
    }
}

/// Three-way odds view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsView {
    /// Home win.
    pub home: Reading,
    /// Draw.
    pub draw: Reading,
    /// Away win.
    pub away: Reading,
}

/// Result slot view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScoreView {
    /// Nothing published.
    Pending,
    /// Published, not revealed.
    Published {
        /// Home score.
        home: Reading,
        /// Away score.
        away: Reading,
    },
    /// Revealed after the final whistle.
    Final {
        /// Home goals.
        home: u64,
        /// Away goals.
        away: u64,
        /// Outcome label.
        outcome: String,
    },
}

/// Match snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    /// Match id.
    pub id: u64,
    /// Home side.
    pub home_team: String,
    /// Away side.
    pub away_team: String,
    /// Kick-off.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Status label.
    pub status: String,
    /// Status wire code.
    pub status_code: u8,
    /// Odds.
    pub odds: OddsView,
    /// Result slot.
    pub score: ScoreView,
}

impl MatchView {
    /// Public view: fingerprints only.
    pub fn redacted(record: &Match) -> Self {
        match Self::build(record, |cv| Ok::<_, Infallible>(Reading::sealed(cv))) {
            Ok(view) => view,
            Err(never) => match never {},
        }
    }

    /// Oracle view: odds opened, scores opened once finished.
    pub fn disclosed(record: &Match, oracle: &Oracle<'_>) -> Result<Self, CodecError> {
        Self::build(record, |cv| Reading::open(cv, oracle))
    }

    fn build<E>(
        record: &Match,
        read: impl Fn(&ConfidentialValue) -> Result<Reading, E>,
    ) -> Result<Self, E> {
        let odds = OddsView {
            home: read(&record.odds.home)?,
            draw: read(&record.odds.draw)?,
            away: read(&record.odds.away)?,
        };
        let score = match &record.scores {
            ScoreBoard::Pending => ScoreView::Pending,
            // Scores stay sealed until the final whistle, even for the oracle
            ScoreBoard::Sealed(sealed) if record.status == MatchStatus::Finished => ScoreView::Published {
                home: read(&sealed.home)?,
                away: read(&sealed.away)?,
            },
            ScoreBoard::Sealed(sealed) => ScoreView::Published {
                home: Reading::sealed(&sealed.home),
                away: Reading::sealed(&sealed.away),
            },
            ScoreBoard::Revealed { score, .. } => ScoreView::Final {
                home: score.home,
                away: score.away,
                outcome: score.outcome().label().to_string(),
            },
        };
        Ok(Self {
            id: record.id.0,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            status: record.status.label().to_string(),
            status_code: record.status.code(),
            odds,
            score,
        })
    }
}

/// Bet snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetView {
    /// Bet id.
    pub id: u64,
    /// Match id.
    pub match_id: u64,
    /// Wallet address.
    pub bettor: String,
    /// Backed side label.
    pub bet_type: String,
    /// Backed side wire code.
    pub bet_type_code: u8,
    /// Stake.
    pub amount: Reading,
    /// Placement time.
    pub placed_at: DateTime<Utc>,
    /// Settled flag.
    pub is_settled: bool,
    /// Win flag, present once settled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_won: Option<bool>,
}

impl BetView {
    /// Public view: fingerprint of the stake only.
    pub fn redacted(bet: &Bet) -> Self {
        Self::build(bet, Reading::sealed(&bet.amount))
    }

    /// Oracle view with the stake opened.
    pub fn disclosed(bet: &Bet, oracle: &Oracle<'_>) -> Result<Self, CodecError> {
        Ok(Self::build(bet, Reading::open(&bet.amount, oracle)?))
    }

    fn build(bet: &Bet, amount: Reading) -> Self {
        Self {
            id: bet.id.0,
            match_id: bet.match_id.0,
            bettor: bet.bettor.to_string(),
            bet_type: bet.bet_type.label().to_string(),
            bet_type_code: bet.bet_type.code(),
            amount,
            placed_at: bet.placed_at,
            is_settled: bet.status != BetStatus::Pending,
            is_won: bet.is_won(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::codec::keys::derive_from_seed;
    use crate::codec::{encrypt, encrypt_odds, encrypt_scores, Odds};
    use crate::core::units::Units;
    use crate::ledger::{BetId, BetType, BettorId};
    use crate::registry::{MatchRegistry, MatchStatus};

    fn units(value: f64) -> Units {
        Units::from_decimal(value).unwrap()
    }

    #[test]
    fn test_redacted_match_hides_values() {
        let (enc, dec) = derive_from_seed(&[51; 32]);
        let mut registry = MatchRegistry::new();
        let t0 = Utc::now();
        let odds = encrypt_odds(Odds { home: units(7.125), draw: units(3.0), away: units(1.5) }, &enc).unwrap();
        let id = registry.create_match("A", "B", t0, t0 + Duration::hours(2), odds).unwrap();
        let scores = encrypt_scores(Units::from_whole(4).unwrap(), Units::ZERO, &enc).unwrap();
        registry.publish_result(id, scores).unwrap();

        let record = registry.get_match(id).unwrap();
        let view = MatchView::redacted(record);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("7.125"));
        assert!(json.contains(&record.odds.home.fingerprint()));
        assert!(matches!(view.score, ScoreView::Published { .. }));
        assert_eq!(view.status, "Upcoming");

        let open = MatchView::disclosed(record, &Oracle::from_key(&dec)).unwrap();
        assert_eq!(open.odds.home, Reading::Open { value: "7.125".into() });
        assert_eq!(open.score, view.score);
    }

    #[test]
    fn test_disclosed_scores_wait_for_finish() {
        let (enc, dec) = derive_from_seed(&[56; 32]);
        let oracle = Oracle::from_key(&dec);
        let mut registry = MatchRegistry::new();
        let t0 = Utc::now();
        let odds = encrypt_odds(Odds { home: units(2.0), draw: units(3.0), away: units(4.0) }, &enc).unwrap();
        let id = registry.create_match("A", "B", t0, t0 + Duration::hours(2), odds).unwrap();
        registry.transition_status(id, MatchStatus::Live).unwrap();
        let scores = encrypt_scores(Units::from_whole(4).unwrap(), Units::ZERO, &enc).unwrap();
        registry.publish_result(id, scores).unwrap();

        let live = MatchView::disclosed(registry.get_match(id).unwrap(), &oracle).unwrap();
        assert_eq!(live.status, "Live");
        let json = serde_json::to_value(&live.score).unwrap();
        assert_eq!(json["home"]["state"], "sealed");
        assert_eq!(json["away"]["state"], "sealed");

        registry.transition_status(id, MatchStatus::Finished).unwrap();
        let finished = MatchView::disclosed(registry.get_match(id).unwrap(), &oracle).unwrap();
        assert_eq!(
            finished.score,
            ScoreView::Published {
                home: Reading::Open { value: "4".into() },
                away: Reading::Open { value: "0".into() },
            }
        );
    }

    #[test]
    fn test_revealed_score_is_public() {
        let (enc, dec) = derive_from_seed(&[52; 32]);
        let mut registry = MatchRegistry::new();
        let t0 = Utc::now();
        let odds = encrypt_odds(Odds { home: units(2.0), draw: units(3.0), away: units(4.0) }, &enc).unwrap();
        let id = registry.create_match("A", "B", t0, t0 + Duration::hours(2), odds).unwrap();
        registry.transition_status(id, MatchStatus::Live).unwrap();
        let scores = encrypt_scores(Units::from_whole(3).unwrap(), Units::from_whole(1).unwrap(), &enc).unwrap();
        registry.publish_result(id, scores).unwrap();
        registry.transition_status(id, MatchStatus::Finished).unwrap();
        registry.reveal_scores(id, &Oracle::from_key(&dec)).unwrap();

        let view = MatchView::redacted(registry.get_match(id).unwrap());
        assert_eq!(view.score, ScoreView::Final { home: 3, away: 1, outcome: "Home Win".into() });
    }

    #[test]
    fn test_bet_views() {
        let (enc, dec) = derive_from_seed(&[53; 32]);
        let bet = Bet {
            id: BetId(4),
            match_id: crate::registry::MatchId(2),
            amount: encrypt(units(123.456789), &enc).unwrap(),
            bet_type: BetType::AwayWin,
            bettor: BettorId::new([0xcd; 20]),
            placed_at: Utc::now(),
            status: BetStatus::Pending,
        };

        let redacted = BetView::redacted(&bet);
        let json = serde_json::to_value(&redacted).unwrap();
        assert!(!json.to_string().contains("123.456789"));
        assert_eq!(json["amount"]["state"], "sealed");
        assert_eq!(json["bet_type"], "Away Win");
        assert!(json.get("is_won").is_none());

        let open = BetView::disclosed(&bet, &Oracle::from_key(&dec)).unwrap();
        assert_eq!(open.amount, Reading::Open { value: "123.456789".into() });
    }

    #[test]
    fn test_disclose_with_wrong_key_fails() {
        let (enc, _) = derive_from_seed(&[54; 32]);
        let (_, other) = derive_from_seed(&[55; 32]);
        let bet = Bet {
            id: BetId(1),
            match_id: crate::registry::MatchId(1),
            amount: encrypt(units(1.0), &enc).unwrap(),
            bet_type: BetType::Draw,
            bettor: BettorId::default(),
            placed_at: Utc::now(),
            status: BetStatus::Won,
        };
        assert!(BetView::disclosed(&bet, &Oracle::from_key(&other)).is_err());
        assert_eq!(BetView::redacted(&bet).is_won, Some(true));
    }
}
