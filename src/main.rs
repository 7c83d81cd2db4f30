//! Secret Stadium Desk
//!
//! Runs one match end to end against an in-process desk: odds and stakes
//! are sealed, the oracle publishes the score, and settlement credits the
//! winners. Prints the redacted views and the journal head.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use secret_stadium::{
    codec::{self, Odds},
    BetType, BettorId, Desk, DeskConfig, MatchStatus, SharedDesk, Units, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DeskConfig::from_env().context("reading configuration")?;

    // RUST_LOG wins over STADIUM_LOG
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("parsing log filter")?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    info!("Secret Stadium v{}", VERSION);

    let (enc, dec) = config.keys();
    info!(oracle_key = %dec.key_id(), issuer = %enc.issuer_id(), "keys ready");
    if config.key_seed.is_none() {
        info!("STADIUM_KEY_SEED not set, using ephemeral keys");
    }

    let service = SharedDesk::new(Desk::new(config, enc.clone()));
    demo_match(&service, &enc, &dec).await
}

/// Drive one match through its whole lifecycle.
async fn demo_match(
    service: &SharedDesk,
    enc: &codec::EncryptionKey,
    dec: &codec::DecryptionKey,
) -> Result<()> {
    info!("=== Opening Match ===");
    let start = Utc::now();
    let odds = codec::encrypt_odds(
        Odds {
            home: Units::from_decimal(2.1)?,
            draw: Units::from_decimal(3.3)?,
            away: Units::from_decimal(3.6)?,
        },
        enc,
    )?;
    let match_id = service
        .create_match("Team A".into(), "Team B".into(), start, start + Duration::minutes(105), odds)
        .await?;

    let alice = BettorId::new([0xa1; 20]);
    let bob = BettorId::new([0xb0; 20]);
    let wagers = [
        (alice, BetType::HomeWin, Units::from_whole(100)?),
        (bob, BetType::Draw, Units::from_whole(40)?),
    ];
    for (bettor, bet_type, stake) in wagers {
        let amount = service.seal(stake).await?;
        let bet_id = service.place_bet(match_id, bet_type, amount, bettor).await?;
        info!(%bet_id, %bettor, %bet_type, "wager sealed");
    }

    info!("=== Full Time ===");
    service.transition_status(match_id, MatchStatus::Live).await?;
    let scores = codec::encrypt_scores(Units::from_whole(3)?, Units::from_whole(1)?, enc)?;
    service.publish_result(match_id, scores).await?;
    service.transition_status(match_id, MatchStatus::Finished).await?;

    let report = service.settle_published(match_id, dec).await?;
    info!(
        outcome = %report.outcome,
        score = %report.score,
        settled = report.settled(),
        "settlement complete"
    );
    for (bet_id, bettor, _) in report.winners() {
        let balance = service.balance(bettor, dec).await;
        info!(%bet_id, %bettor, %balance, "winner credited");
    }

    info!("=== Public Views ===");
    println!("{}", serde_json::to_string_pretty(&service.match_views().await)?);
    println!("{}", serde_json::to_string_pretty(&service.bet_views(alice).await)?);

    let journal = service.journal().await;
    journal.verify_chain()?;
    info!(events = journal.len(), head = %hex::encode(journal.head()), "journal verified");
    Ok(())
}
