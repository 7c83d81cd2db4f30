//! Core primitives.
//!
//! Integer-only numeric policy and hashing helpers shared by every other
//! module. Nothing in here reads the clock or holds secrets.

pub mod units;
pub mod hash;

// Re-export core types
pub use units::{Units, UnitsError, UNIT_SCALE, MAX_UNITS};
pub use hash::{Digest32, fingerprint};
