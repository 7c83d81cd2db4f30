//! Bet Ledger
//!
//! Append-only bet records and the wallet balances they pay into.

pub mod bet;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod treasury;

pub use bet::{Bet, BetId, BetStatus, BetType, BettorId};
pub use ledger::{BetLedger, LedgerError};
pub use treasury::{Treasury, TreasuryError};
