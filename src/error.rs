//! Error taxonomy for token lifecycle operations.
//!
//! Callers branch on the variant, not on message text. `Expired` is kept
//! distinct from `Invalid` so middleware can trigger a silent refresh
//! instead of forcing re-authentication.

use crate::jwt::TokenType;
use thiserror::Error;

/// Errors surfaced by token lifecycle operations.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Signature valid but `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// Bad signature, wrong issuer/audience, or malformed structure.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Cryptographically valid token presented to the wrong operation.
    #[error("invalid token type: expected {expected}, got {actual}")]
    WrongType {
        /// Type the operation requires.
        expected: TokenType,
        /// Type the token actually carries.
        actual: TokenType,
    },

    /// Explicit blacklist hit; takes precedence over cryptographic validity.
    #[error("token has been revoked")]
    Revoked,

    /// Cryptographically valid token with no issuance record in the store.
    #[error("token not found in store")]
    NotFound,

    /// Key-value store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// JWT encoding failure.
    #[error("signing error: {0}")]
    Signing(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TokenError {
    /// Create an `Invalid` error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Create a `Storage` error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a `Signing` error.
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create a `Config` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<redis::RedisError> for TokenError {
    fn from(err: redis::RedisError) -> Self {
        TokenError::Storage(err.to_string())
    }
}
