//! Property-Based Tests for the Confidential Value Codec
//!
//! Uses proptest to check the seal/open/verify contract over random payloads.

use proptest::prelude::*;
use secret_stadium::codec::{self, keys::derive_from_seed, ConfidentialValue};
use secret_stadium::core::units::{Units, MAX_UNITS};
use secret_stadium::{FinalScore, Outcome};

// =============================================================================
// PROPTEST STRATEGIES
// =============================================================================

/// Strategy for seeds
fn bytes32() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Strategy for valid payloads
fn units() -> impl Strategy<Value = Units> {
    (0..=MAX_UNITS).prop_map(|raw| Units::from_raw(raw).unwrap())
}

// =============================================================================
// CODEC PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every sealed value verifies and opens to itself
    #[test]
    fn sealed_values_round_trip(seed in bytes32(), value in units()) {
        let (enc, dec) = derive_from_seed(&seed);
        let cv = codec::encrypt(value, &enc).unwrap();

        prop_assert!(codec::verify(&cv));
        prop_assert!(codec::verify_issued_by(&cv, &enc.issuer()));
        prop_assert_eq!(codec::decrypt(&cv, &dec).unwrap(), value);
    }

    /// Property: flipping any byte of ciphertext or proof breaks verification
    #[test]
    fn single_byte_mutation_fails_verify(
        seed in bytes32(),
        value in units(),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
        in_proof in any::<bool>(),
    ) {
        let (enc, _) = derive_from_seed(&seed);
        let (mut ciphertext, mut proof) = codec::encrypt(value, &enc).unwrap().into_parts();
        if in_proof {
            let i = position.index(proof.len());
            proof[i] ^= flip;
        } else {
            let i = position.index(ciphertext.len());
            ciphertext[i] ^= flip;
        }

        prop_assert!(!codec::verify(&ConfidentialValue::from_parts(ciphertext, proof)));
    }

    /// Property: two seals of the same value never collide
    #[test]
    fn sealing_is_randomized(seed in bytes32(), value in units()) {
        let (enc, _) = derive_from_seed(&seed);
        let a = codec::encrypt(value, &enc).unwrap();
        let b = codec::encrypt(value, &enc).unwrap();

        prop_assert_ne!(a.ciphertext(), b.ciphertext());
        prop_assert_ne!(a.fingerprint(), b.fingerprint());
    }

    /// Property: a value sealed to one oracle does not open under another
    #[test]
    fn foreign_key_cannot_open(a in bytes32(), b in bytes32(), value in units()) {
        prop_assume!(a != b);
        let (enc, _) = derive_from_seed(&a);
        let (_, other) = derive_from_seed(&b);
        let cv = codec::encrypt(value, &enc).unwrap();

        prop_assert!(codec::decrypt(&cv, &other).is_err());
    }
}

// =============================================================================
// OUTCOME PROPERTIES
// =============================================================================

proptest! {
    /// Property: the outcome follows the score comparison
    #[test]
    fn outcome_matches_score(home in 0u64..20, away in 0u64..20) {
        let expected = if home > away {
            Outcome::HomeWin
        } else if away > home {
            Outcome::AwayWin
        } else {
            Outcome::Draw
        };
        prop_assert_eq!(FinalScore::new(home, away).outcome(), expected);
    }

    /// Property: stake × odds truncates and never exceeds the exact product
    #[test]
    fn payout_truncates(stake in 0u64..=1_000_000_000_000, odds in 1_000_000u64..=100_000_000) {
        let stake = Units::from_raw(stake).unwrap();
        let odds = Units::from_raw(odds).unwrap();
        let payout = stake.checked_mul(odds).unwrap();

        let exact = stake.raw() as u128 * odds.raw() as u128;
        prop_assert!(payout.raw() as u128 * 1_000_000 <= exact);
        prop_assert!(exact - payout.raw() as u128 * 1_000_000 < 1_000_000);
    }
}
