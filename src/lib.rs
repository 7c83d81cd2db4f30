//! # Secret Stadium
//!
//! Confidential sports-wagering core: stakes, odds and scores travel as
//! encrypted values with public proofs, and only the oracle can open them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SECRET STADIUM                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── units.rs    - Six-decimal fixed-point payloads          │
//! │  └── hash.rs     - Fingerprints and journal digests          │
//! │                                                              │
//! │  codec/          - Confidential values (seal/open/verify)    │
//! │  registry/       - Matches and their lifecycle               │
//! │  ledger/         - Bets and wallet balances                  │
//! │  settlement/     - Win/loss for finished matches             │
//! │                                                              │
//! │  auth.rs         - Oracle capability, JWT roles              │
//! │  view.rs         - Redacted and disclosed presentation       │
//! │  config.rs       - Environment configuration                 │
//! │  desk/           - Journaled desk and async shared service   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Confidentiality
//!
//! - Anyone can check a [`ConfidentialValue`] proof with [`codec::verify`]
//! - Opening a value needs an [`Oracle`], built around the oracle secret
//! - Logs, views and the journal carry ciphertext fingerprints only
//! - The stores never read the clock; callers pass `now`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod codec;
pub mod auth;
pub mod registry;
pub mod ledger;
pub mod settlement;
pub mod view;
pub mod config;
pub mod desk;

// Re-export commonly used types
pub use core::units::{Units, UNIT_SCALE};
pub use codec::{ConfidentialValue, DecryptionKey, EncryptionKey, Odds, SealedOdds, SealedScores};
pub use auth::Oracle;
pub use registry::{FinalScore, Match, MatchId, MatchRegistry, MatchStatus, Outcome};
pub use ledger::{Bet, BetId, BetLedger, BetType, BettorId, Treasury};
pub use settlement::{settle_match, SettlementReport};
pub use config::DeskConfig;
pub use desk::{Desk, DeskError, SharedDesk};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
