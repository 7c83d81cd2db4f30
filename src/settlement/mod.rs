//! Settlement
//!
//! Determines win/loss for every bet on a finished match.

pub mod engine;

pub use engine::{settle_match, BetSettlement, Disposition, SettlementError, SettlementReport};
