//! Match Registry
//!
//! Match records and their lifecycle state machine.

pub mod state;
#[allow(clippy::module_inception)]
pub mod registry;

pub use state::{Match, MatchId, MatchStatus, Outcome, FinalScore, ScoreBoard};
pub use registry::{MatchRegistry, RegistryError};
