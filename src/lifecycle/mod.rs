//! Token lifecycle management: issuance, validation, rotation, revocation.

pub mod manager;

pub use manager::{TokenManager, TokenPair};
