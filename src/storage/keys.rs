//! Namespaced key scheme for issuance and blacklist records.
//!
//! Raw token strings never appear in store keys; each key embeds a
//! base64url SHA-256 digest of the token instead.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

/// Namespace prefix for access-token issuance records.
pub const ACCESS_TOKEN_PREFIX: &str = "access_token:";
/// Namespace prefix for refresh-token issuance records.
pub const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";
/// Namespace prefix for blacklist records.
pub const BLACKLIST_PREFIX: &str = "blacklist:";

/// Digest a raw token string for use in store keys.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Issuance-record key for an access token.
#[must_use]
pub fn access_token_key(token: &str) -> String {
    format!("{ACCESS_TOKEN_PREFIX}{}", token_digest(token))
}

/// Issuance-record key for a refresh token.
#[must_use]
pub fn refresh_token_key(token: &str) -> String {
    format!("{REFRESH_TOKEN_PREFIX}{}", token_digest(token))
}

/// Blacklist key for a raw token string.
#[must_use]
pub fn blacklist_key(token: &str) -> String {
    format!("{BLACKLIST_PREFIX}{}", token_digest(token))
}

/// Blacklist key for a digest recovered from a scanned issuance key.
#[must_use]
pub fn blacklist_key_from_digest(digest: &str) -> String {
    format!("{BLACKLIST_PREFIX}{digest}")
}

/// Recover the token digest from an issuance key, if it carries the
/// expected namespace prefix.
#[must_use]
pub fn digest_from_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(token_digest("token-a"), token_digest("token-a"));
        assert_ne!(token_digest("token-a"), token_digest("token-b"));
    }

    #[test]
    fn test_key_namespaces_are_disjoint() {
        let token = "some.jwt.token";
        let access = access_token_key(token);
        let refresh = refresh_token_key(token);
        let blacklist = blacklist_key(token);

        assert!(access.starts_with(ACCESS_TOKEN_PREFIX));
        assert!(refresh.starts_with(REFRESH_TOKEN_PREFIX));
        assert!(blacklist.starts_with(BLACKLIST_PREFIX));
        assert_ne!(access, refresh);
        assert_ne!(access, blacklist);
    }

    #[test]
    fn test_blacklist_key_from_scanned_digest() {
        let token = "some.jwt.token";
        let access = access_token_key(token);

        let digest = digest_from_key(&access, ACCESS_TOKEN_PREFIX).unwrap();
        assert_eq!(blacklist_key_from_digest(digest), blacklist_key(token));
    }

    #[test]
    fn test_digest_from_key_wrong_prefix() {
        let key = refresh_token_key("t");
        assert!(digest_from_key(&key, ACCESS_TOKEN_PREFIX).is_none());
    }
}
