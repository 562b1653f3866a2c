//! HS256 token issuance and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use ledgerbank_core::AccountNumber;

use crate::claims::{AccountClaims, validate_claims};
use crate::error::AuthError;

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccountClaims, AuthError>;
}

/// Signs tokens for authenticated accounts.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, account_number: AccountNumber, now: DateTime<Utc>) -> Result<String, AuthError>;
}

/// Validator for HMAC-SHA256 signed tokens. Any other algorithm is rejected.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The time window lives in our own claims; see `validate_claims`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccountClaims, AuthError> {
        let data = jsonwebtoken::decode::<AccountClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// Issuer for HMAC-SHA256 signed tokens with a fixed lifetime.
pub struct Hs256TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl Hs256TokenIssuer {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(&secret),
            ttl,
        }
    }
}

impl TokenIssuer for Hs256TokenIssuer {
    fn issue(&self, account_number: AccountNumber, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = AccountClaims::new(account_number, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}
