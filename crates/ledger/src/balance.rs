//! Guarded balance arithmetic.
//!
//! Every balance mutation is a signed delta plus a guard. Stores must evaluate
//! the guard and the mutation as one atomic step; this module defines what the
//! step computes so every store agrees on the outcome.

use crate::money::Money;

/// Condition that must hold on the *current* balance for a delta to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceGuard {
    /// Apply unconditionally (credits, top-ups).
    None,
    /// Apply only if the balance is at least this amount (debits).
    AtLeast(Money),
}

impl BalanceGuard {
    pub fn admits(&self, balance: Money) -> bool {
        match self {
            BalanceGuard::None => true,
            BalanceGuard::AtLeast(min) => balance >= *min,
        }
    }

    /// Threshold to bind into a single conditional update, if any.
    pub fn threshold(&self) -> Option<Money> {
        match self {
            BalanceGuard::None => None,
            BalanceGuard::AtLeast(min) => Some(*min),
        }
    }
}

/// Result of applying a delta to one balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    Applied(Money),
    /// The guard rejected the balance, or the result would be negative.
    /// Stores report this as "no row affected".
    Refused,
    /// The result exceeds the largest storable balance.
    OutOfRange,
}

/// Compute the balance after applying `delta` under `guard`.
pub fn apply_delta(balance: Money, delta: Money, guard: BalanceGuard) -> DeltaOutcome {
    if !guard.admits(balance) {
        return DeltaOutcome::Refused;
    }
    match balance.checked_add(delta) {
        None => DeltaOutcome::OutOfRange,
        Some(next) if next.is_negative() => DeltaOutcome::Refused,
        Some(next) => DeltaOutcome::Applied(next),
    }
}
