//! JWT claims model and signing/verification codec.

pub mod claims;
pub mod codec;

pub use claims::{TokenClaims, TokenSubject, TokenType};
pub use codec::{decode_unverified, JwtCodec};
