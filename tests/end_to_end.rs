//! End-to-end wagering flow through the public API.

use chrono::{Duration, Utc};
use secret_stadium::codec::{self, keys::derive_from_seed, Odds};
use secret_stadium::desk::DeskEventData;
use secret_stadium::ledger::LedgerError;
use secret_stadium::registry::RegistryError;
use secret_stadium::{
    settle_match, BetLedger, BetType, BettorId, Desk, DeskConfig, DeskError, FinalScore,
    MatchRegistry, MatchStatus, Oracle, Outcome, SharedDesk, Units,
};

fn units(value: f64) -> Units {
    Units::from_decimal(value).unwrap()
}

#[test]
fn home_win_pays_stake_times_odds() {
    let (enc, dec) = derive_from_seed(&[1; 32]);
    let oracle = Oracle::from_key(&dec);
    let mut registry = MatchRegistry::new();
    let mut ledger = BetLedger::new();
    let t0 = Utc::now();

    let odds = codec::encrypt_odds(Odds { home: units(2.25), draw: units(3.1), away: units(3.4) }, &enc).unwrap();
    let id = registry.create_match("A", "B", t0, t0 + Duration::hours(2), odds).unwrap();

    let stake = codec::encrypt(units(100.0), &enc).unwrap();
    let bettor = BettorId::new([7; 20]);
    let bet_id = ledger.place_bet(&registry, id, BetType::HomeWin, stake, bettor, t0).unwrap();
    assert!(!ledger.get_bet(bet_id).unwrap().is_settled());

    registry.transition_status(id, MatchStatus::Live).unwrap();
    let scores = codec::encrypt_scores(Units::from_whole(3).unwrap(), Units::from_whole(1).unwrap(), &enc).unwrap();
    registry.publish_result(id, scores).unwrap();
    registry.transition_status(id, MatchStatus::Finished).unwrap();

    let score = registry.reveal_scores(id, &oracle).unwrap();
    assert_eq!(score, FinalScore::new(3, 1));

    let report = settle_match(&registry, &mut ledger, id, score, &oracle).unwrap();
    assert_eq!(report.outcome, Outcome::HomeWin);
    assert_eq!(ledger.get_bet(bet_id).unwrap().is_won(), Some(true));

    let payout: Vec<_> = report.winners().collect();
    assert_eq!(payout, vec![(bet_id, bettor, units(225.0))]);

    // Placing after the whistle is refused
    let late = codec::encrypt(units(1.0), &enc).unwrap();
    assert!(matches!(
        ledger.place_bet(&registry, id, BetType::Draw, late, bettor, t0),
        Err(LedgerError::MatchNotBettable { status: MatchStatus::Finished, .. })
    ));
}

#[test]
fn finished_match_rejects_going_live_again() {
    let (enc, _) = derive_from_seed(&[2; 32]);
    let mut registry = MatchRegistry::new();
    let t0 = Utc::now();
    let odds = codec::encrypt_odds(Odds { home: units(2.0), draw: units(2.0), away: units(2.0) }, &enc).unwrap();
    let id = registry.create_match("A", "B", t0, t0 + Duration::hours(1), odds).unwrap();

    registry.transition_status(id, MatchStatus::Live).unwrap();
    let scores = codec::encrypt_scores(Units::ZERO, Units::ZERO, &enc).unwrap();
    registry.publish_result(id, scores).unwrap();
    registry.transition_status(id, MatchStatus::Finished).unwrap();

    assert!(matches!(
        registry.transition_status(id, MatchStatus::Live),
        Err(RegistryError::InvalidTransition { from: MatchStatus::Finished, to: MatchStatus::Live, .. })
    ));
}

#[tokio::test]
async fn shared_desk_journals_the_whole_flow() {
    let (enc, dec) = derive_from_seed(&[3; 32]);
    let service = SharedDesk::new(Desk::new(DeskConfig::default(), enc.clone()));
    let t0 = Utc::now();

    let odds = codec::encrypt_odds(Odds { home: units(1.5), draw: units(4.0), away: units(6.0) }, &enc).unwrap();
    let id = service
        .create_match("Harbour".into(), "Valley".into(), t0, t0 + Duration::hours(2), odds)
        .await
        .unwrap();

    let winner = BettorId::new([0x11; 20]);
    let loser = BettorId::new([0x22; 20]);
    let stake = service.seal(units(20.0)).await.unwrap();
    service.place_bet(id, BetType::Draw, stake, winner).await.unwrap();
    let stake = service.seal(units(20.0)).await.unwrap();
    service.place_bet(id, BetType::AwayWin, stake, loser).await.unwrap();

    // Not finished yet
    assert!(matches!(
        service.settle_published(id, &dec).await,
        Err(DeskError::Registry(RegistryError::NotFinished { .. }))
    ));

    service.transition_status(id, MatchStatus::Live).await.unwrap();
    let scores = codec::encrypt_scores(Units::from_whole(2).unwrap(), Units::from_whole(2).unwrap(), &enc).unwrap();
    service.publish_result(id, scores).await.unwrap();
    service.transition_status(id, MatchStatus::Finished).await.unwrap();

    let report = service.settle_published(id, &dec).await.unwrap();
    assert_eq!(report.outcome, Outcome::Draw);
    assert_eq!(report.total_payout(), units(80.0));
    assert_eq!(service.balance(winner, &dec).await, units(80.0));
    assert_eq!(service.balance(loser, &dec).await, Units::ZERO);

    let journal = service.journal().await;
    journal.verify_chain().unwrap();
    let kinds: Vec<&str> = journal
        .events()
        .iter()
        .map(|e| match e.data {
            DeskEventData::MatchCreated { .. } => "created",
            DeskEventData::StatusChanged { .. } => "status",
            DeskEventData::ResultPublished { .. } => "published",
            DeskEventData::ScoresRevealed { .. } => "revealed",
            DeskEventData::BetPlaced { .. } => "bet",
            DeskEventData::BetSettled { .. } => "settled",
            DeskEventData::PayoutCredited { .. } => "credited",
            DeskEventData::Withdrawal { .. } => "withdrawal",
            DeskEventData::PayoutFailed { .. } => "payout_failed",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "created", "bet", "bet", "status", "published", "status", "revealed", "settled", "settled",
            "credited",
        ]
    );

    // Public JSON never carries the stakes
    let views = serde_json::to_string(&service.bet_views(winner).await).unwrap();
    assert!(views.contains("\"is_won\":true"));
    assert!(!views.contains("\"20\""));
}
