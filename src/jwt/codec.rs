//! Signing and verification wrapper over `jsonwebtoken`.
//!
//! One codec is built per secret dimension; the manager holds one for
//! access tokens and one for refresh tokens.

use crate::error::TokenError;
use crate::jwt::claims::TokenClaims;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// HS256 codec bound to a single secret, issuer and audience.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Create a codec for the given secret.
    ///
    /// Verification checks signature, expiry, and exact issuer/audience
    /// match; an issuer or audience mismatch is invalid, not ignored.
    pub fn new(secret: &[u8], issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.validate_exp = true;
        // Expiry is exact; no clock-skew leeway.
        validation.leeway = 0;

        JwtCodec {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign claims into a compact token string.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// An expired signature maps to [`TokenError::Expired`]; every other
    /// failure (bad signature, issuer/audience mismatch, malformed
    /// structure) maps to [`TokenError::Invalid`].
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                    TokenError::Expired
                } else {
                    TokenError::Invalid(e.to_string())
                }
            })
    }
}

/// Parse a token's payload without verifying the signature.
///
/// Used only for introspection (blacklist TTL computation, display
/// helpers); never a substitute for [`JwtCodec::decode`].
#[must_use]
pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::{TokenSubject, TokenType};

    fn test_claims(ttl: i64) -> TokenClaims {
        let subject = TokenSubject::new("user-123", "a@b.com", "USER");
        TokenClaims::new(&subject, TokenType::Access, ttl, "test-issuer", "test-api")
    }

    #[test]
    fn test_round_trip() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let claims = test_claims(900);

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_expired_maps_to_expired() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let token = codec.encode(&test_claims(-120)).unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let other = JwtCodec::new(b"other-secret", "test-issuer", "test-api");
        let token = codec.encode(&test_claims(900)).unwrap();

        assert!(matches!(other.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_issuer_mismatch_is_invalid() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let other = JwtCodec::new(b"test-secret", "another-issuer", "test-api");
        let token = codec.encode(&test_claims(900)).unwrap();

        assert!(matches!(other.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_audience_mismatch_is_invalid() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let other = JwtCodec::new(b"test-secret", "test-issuer", "another-api");
        let token = codec.encode(&test_claims(900)).unwrap();

        assert!(matches!(other.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_malformed_is_invalid() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");

        assert!(matches!(
            codec.decode("not-a-token"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_decode_unverified_reads_payload() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let claims = test_claims(900);
        let token = codec.encode(&claims).unwrap();

        let parsed = decode_unverified(&token).unwrap();
        assert_eq!(parsed.user_id, "user-123");
        assert_eq!(parsed.exp, claims.exp);
    }

    #[test]
    fn test_decode_unverified_rejects_garbage() {
        assert!(decode_unverified("garbage").is_none());
        assert!(decode_unverified("a.b.c.d").is_none());
        assert!(decode_unverified("a.!!!.c").is_none());
    }

    #[test]
    fn test_decode_unverified_ignores_signature() {
        let codec = JwtCodec::new(b"test-secret", "test-issuer", "test-api");
        let token = codec.encode(&test_claims(900)).unwrap();

        // Corrupt the signature segment; introspection still works.
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[2] = "tampered";
        let tampered = parts.join(".");

        assert!(decode_unverified(&tampered).is_some());
        assert!(codec.decode(&tampered).is_err());
    }
}
