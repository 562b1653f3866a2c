//! `ledgerbank-auth`: credential and token primitives for the access gate.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod error;
pub mod password;
pub mod token;

pub use claims::{AccountClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator, TokenIssuer};
