//! Validated ledger commands.

use ledgerbank_core::{AccountNumber, DomainResult};

use crate::balance::BalanceGuard;
use crate::money::Money;

/// Move `amount` from one account to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: AccountNumber,
    pub to: AccountNumber,
    pub amount: Money,
}

impl Transfer {
    /// Sender and receiver may be equal; only the amount is validated.
    pub fn new(from: AccountNumber, to: AccountNumber, amount: &str) -> DomainResult<Self> {
        Ok(Self {
            from,
            to,
            amount: Money::parse_positive(amount)?,
        })
    }

    /// Debit leg: only applies if the sender holds at least `amount`.
    pub fn debit(&self) -> (AccountNumber, Money, BalanceGuard) {
        (self.from, -self.amount, BalanceGuard::AtLeast(self.amount))
    }

    /// Credit leg: unconditional.
    pub fn credit(&self) -> (AccountNumber, Money, BalanceGuard) {
        (self.to, self.amount, BalanceGuard::None)
    }

    /// Account numbers in lock order (ascending, deduplicated).
    pub fn lock_order(&self) -> Vec<AccountNumber> {
        let mut accounts = vec![self.from, self.to];
        accounts.sort();
        accounts.dedup();
        accounts
    }
}

/// Fund an account from outside the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUp {
    pub account: AccountNumber,
    pub amount: Money,
}

impl TopUp {
    pub fn new(account: AccountNumber, amount: &str) -> DomainResult<Self> {
        Ok(Self {
            account,
            amount: Money::parse_positive(amount)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerbank_core::DomainError;

    #[test]
    fn transfer_legs_are_guarded_debit_then_plain_credit() {
        let t = Transfer::new(AccountNumber::new(5), AccountNumber::new(3), "40.00").unwrap();
        let (from, delta, guard) = t.debit();
        assert_eq!(from.get(), 5);
        assert_eq!(delta.to_string(), "-40.00");
        assert_eq!(guard, BalanceGuard::AtLeast(t.amount));
        assert_eq!(t.credit().2, BalanceGuard::None);
        assert_eq!(t.lock_order(), vec![AccountNumber::new(3), AccountNumber::new(5)]);
    }

    #[test]
    fn self_transfer_locks_once() {
        let t = Transfer::new(AccountNumber::new(5), AccountNumber::new(5), "1").unwrap();
        assert_eq!(t.lock_order().len(), 1);
    }

    #[test]
    fn invalid_amounts_fail_validation() {
        for bad in ["0", "-1", "ten", ""] {
            assert!(matches!(
                Transfer::new(AccountNumber::new(1), AccountNumber::new(2), bad),
                Err(DomainError::Validation(_))
            ));
            assert!(matches!(
                TopUp::new(AccountNumber::new(1), bad),
                Err(DomainError::Validation(_))
            ));
        }
    }
}
