use ledgerbank_auth::AccountClaims;
use ledgerbank_core::AccountNumber;

/// Authenticated caller for a request, derived from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    claims: AccountClaims,
}

impl CallerContext {
    pub fn new(claims: AccountClaims) -> Self {
        Self { claims }
    }

    pub fn account_number(&self) -> AccountNumber {
        self.claims.account_number
    }

    pub fn claims(&self) -> &AccountClaims {
        &self.claims
    }
}
