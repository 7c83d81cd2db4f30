//! Treasury
//!
//! Per-wallet balances credited by settlement payouts. Balances are only
//! readable through the oracle capability, and withdrawals arrive sealed
//! like stakes do.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::Oracle;
use crate::codec::{self, CodecError, ConfidentialValue};
use crate::core::units::Units;
use crate::ledger::bet::BettorId;

/// Treasury errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreasuryError {
    /// Withdrawal amount proof does not verify.
    #[error("withdrawal amount failed proof verification")]
    InvalidProof,

    /// Balance too small.
    #[error("insufficient funds for {bettor}: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Wallet.
        bettor: BettorId,
        /// Requested amount.
        requested: Units,
        /// Current balance.
        available: Units,
    },

    /// Credit would overflow the balance width.
    #[error("balance of {0} would overflow")]
    Overflow(BettorId),

    /// Decryption failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Wallet balances.
#[derive(Debug, Default)]
pub struct Treasury {
    balances: BTreeMap<BettorId, Units>,
}

impl Treasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a wallet balance. Returns the new balance.
    pub fn credit(&mut self, bettor: BettorId, amount: Units) -> Result<Units, TreasuryError> {
        let current = self.balances.get(&bettor).copied().unwrap_or_default();
        let updated = current.checked_add(amount).ok_or(TreasuryError::Overflow(bettor))?;
        self.balances.insert(bettor, updated);
        Ok(updated)
    }

    /// Privileged balance read.
    pub fn balance(&self, bettor: &BettorId, _oracle: &Oracle<'_>) -> Units {
        self.balances.get(bettor).copied().unwrap_or_default()
    }

    /// Withdraw a sealed amount. Returns the amount withdrawn.
    pub fn withdraw(
        &mut self,
        bettor: BettorId,
        amount: &ConfidentialValue,
        oracle: &Oracle<'_>,
    ) -> Result<Units, TreasuryError> {
        if !codec::verify(amount) {
            return Err(TreasuryError::InvalidProof);
        }
        let requested = oracle.decrypt(amount)?;
        let available = self.balances.get(&bettor).copied().unwrap_or_default();
        let remaining = available.checked_sub(requested).ok_or(TreasuryError::InsufficientFunds {
            bettor,
            requested,
            available,
        })?;
        self.balances.insert(bettor, remaining);
        Ok(requested)
    }

    /// Number of wallets with a balance entry.
    pub fn accounts(&self) -> usize {
        self.balances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::keys::derive_from_seed;

    fn units(value: u64) -> Units {
        Units::from_whole(value).unwrap()
    }

    #[test]
    fn test_credit_and_withdraw() {
        let (enc, dec) = derive_from_seed(&[31; 32]);
        let oracle = Oracle::from_key(&dec);
        let who = BettorId::new([1; 20]);
        let mut treasury = Treasury::new();

        assert_eq!(treasury.credit(who, units(250)), Ok(units(250)));
        assert_eq!(treasury.balance(&who, &oracle), units(250));

        let sealed = codec::encrypt(units(100), &enc).unwrap();
        assert_eq!(treasury.withdraw(who, &sealed, &oracle), Ok(units(100)));
        assert_eq!(treasury.balance(&who, &oracle), units(150));
    }

    #[test]
    fn test_overdraw_rejected() {
        let (enc, dec) = derive_from_seed(&[32; 32]);
        let oracle = Oracle::from_key(&dec);
        let who = BettorId::new([2; 20]);
        let mut treasury = Treasury::new();
        treasury.credit(who, units(10)).unwrap();

        let sealed = codec::encrypt(units(11), &enc).unwrap();
        assert!(matches!(
            treasury.withdraw(who, &sealed, &oracle),
            Err(TreasuryError::InsufficientFunds { .. })
        ));
        assert_eq!(treasury.balance(&who, &oracle), units(10));
    }

    #[test]
    fn test_forged_withdrawal_rejected() {
        let (enc, dec) = derive_from_seed(&[33; 32]);
        let oracle = Oracle::from_key(&dec);
        let who = BettorId::new([3; 20]);
        let mut treasury = Treasury::new();
        treasury.credit(who, units(10)).unwrap();

        let sealed = codec::encrypt(units(1), &enc).unwrap();
        let forged = ConfidentialValue::from_parts(sealed.ciphertext().to_vec(), vec![7; 96]);
        assert_eq!(treasury.withdraw(who, &forged, &oracle), Err(TreasuryError::InvalidProof));
    }

    #[test]
    fn test_balance_grows_past_payload_range() {
        let who = BettorId::new([4; 20]);
        let mut treasury = Treasury::new();
        treasury.credit(who, units(900_000_000)).unwrap();
        let total = treasury.credit(who, units(200_000_000)).unwrap();
        assert_eq!(total.raw(), 1_100_000_000 * 1_000_000);
    }

    #[test]
    fn test_credit_overflow() {
        let who = BettorId::new([5; 20]);
        let mut treasury = Treasury::new();
        let huge = Units::MAX.checked_mul(units(10_000)).unwrap();
        treasury.credit(who, huge).unwrap();
        assert_eq!(treasury.credit(who, huge), Err(TreasuryError::Overflow(who)));
        assert_eq!(treasury.credit(who, Units::ONE).map(|b| b.raw()), Ok(huge.raw() + 1_000_000));
    }

    #[test]
    fn test_rejected_withdrawal_opens_no_account() {
        let (enc, dec) = derive_from_seed(&[34; 32]);
        let oracle = Oracle::from_key(&dec);
        let mut treasury = Treasury::new();

        let sealed = codec::encrypt(units(1), &enc).unwrap();
        let stranger = BettorId::new([6; 20]);
        assert!(matches!(
            treasury.withdraw(stranger, &sealed, &oracle),
            Err(TreasuryError::InsufficientFunds { .. })
        ));
        assert_eq!(treasury.accounts(), 0);
    }
}
