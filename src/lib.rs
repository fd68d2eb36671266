//! Token Lifecycle library.
//!
//! Provides access/refresh token pair issuance, full validation pipelines
//! with server-side revocation, single-use refresh rotation, and bulk
//! revocation by user or session over a TTL-bearing key-value store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod jwt;
pub mod lifecycle;
pub mod storage;

// Re-exports for convenience
pub use config::TokenConfig;
pub use error::TokenError;
pub use jwt::{TokenClaims, TokenSubject, TokenType};
pub use lifecycle::{TokenManager, TokenPair};
pub use storage::{KeyValueStore, MemoryStore, RedisStore};
