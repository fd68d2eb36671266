//! The token lifecycle manager.
//!
//! Conceptual per-token state machine:
//! `issued -> active -> { validated | expired | blacklisted }`.
//! Expiry is natural; blacklisting is explicit, pre-emptive revocation
//! that overrides cryptographic validity.

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::jwt::{decode_unverified, JwtCodec, TokenClaims, TokenSubject, TokenType};
use crate::storage::{keys, KeyValueStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Result of a token-pair issuance.
///
/// Both tokens are independently valid until their own expiry; a pair has
/// no combined lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived credential authorizing API requests.
    pub access_token: String,
    /// Long-lived credential used solely to mint new pairs; single-use.
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Issues, validates, rotates and revokes tokens over a key-value store.
///
/// The manager is stateless: it holds only configuration, codecs and a
/// store handle, so a single instance is shared across requests. The
/// store is the only shared mutable resource; it provides per-key
/// atomicity and nothing more.
pub struct TokenManager<S: KeyValueStore> {
    store: S,
    access_codec: JwtCodec,
    refresh_codec: JwtCodec,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    password_reset_ttl: Duration,
    email_verification_ttl: Duration,
}

impl<S: KeyValueStore> TokenManager<S> {
    /// Build a manager from configuration and a store handle.
    ///
    /// Reset and verification tokens are signed with the access secret,
    /// matching the reference behavior.
    pub fn new(store: S, config: &TokenConfig) -> Self {
        let access_codec = JwtCodec::new(
            config.access_secret.as_bytes(),
            &config.issuer,
            &config.audience,
        );
        let refresh_codec = JwtCodec::new(
            config.refresh_secret.as_bytes(),
            &config.issuer,
            &config.audience,
        );

        TokenManager {
            store,
            access_codec,
            refresh_codec,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
            password_reset_ttl: config.password_reset_ttl,
            email_verification_ttl: config.email_verification_ttl,
        }
    }

    /// Issue an access/refresh token pair and record both in the store.
    ///
    /// Each token is signed with its own secret and TTL, and its issuance
    /// record carries a matching TTL so it expires with the token.
    pub async fn generate_token_pair(
        &self,
        subject: &TokenSubject,
    ) -> Result<TokenPair, TokenError> {
        let access_claims = TokenClaims::new(
            subject,
            TokenType::Access,
            self.access_token_ttl.as_secs() as i64,
            &self.issuer,
            &self.audience,
        );
        let refresh_claims = TokenClaims::new(
            subject,
            TokenType::Refresh,
            self.refresh_token_ttl.as_secs() as i64,
            &self.issuer,
            &self.audience,
        );

        let access_token = self.access_codec.encode(&access_claims)?;
        let refresh_token = self.refresh_codec.encode(&refresh_claims)?;

        self.record_issuance(
            &keys::access_token_key(&access_token),
            &access_claims,
            self.access_token_ttl,
        )
        .await?;
        self.record_issuance(
            &keys::refresh_token_key(&refresh_token),
            &refresh_claims,
            self.refresh_token_ttl,
        )
        .await?;

        info!(user_id = %subject.user_id, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_ttl.as_secs() as i64,
        })
    }

    /// Verify an access token's signature, expiry, issuer, audience and
    /// type. Local check only; the store is not consulted.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = self.access_codec.decode(token)?;
        assert_type(claims, TokenType::Access)
    }

    /// Verify a refresh token's signature, expiry, issuer, audience and
    /// type. Local check only; the store is not consulted.
    pub fn verify_refresh_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = self.refresh_codec.decode(token)?;
        assert_type(claims, TokenType::Refresh)
    }

    /// Full access-token validation pipeline, used on every authenticated
    /// request.
    ///
    /// Checks run strictly in order: blacklist lookup (revocation takes
    /// precedence over cryptographic validity), signature/expiry/type
    /// verification, then issuance-record presence. The last check
    /// catches tokens whose record was evicted or never existed, such as
    /// replays of tokens minted elsewhere.
    pub async fn validate_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        if self.store.exists(&keys::blacklist_key(token)).await? {
            return Err(TokenError::Revoked);
        }

        let claims = self.verify_access_token(token)?;

        if !self.store.exists(&keys::access_token_key(token)).await? {
            return Err(TokenError::NotFound);
        }

        Ok(claims)
    }

    /// Exchange a refresh token for a new token pair, consuming it.
    ///
    /// The presented token is blacklisted before the new pair is issued,
    /// so a leaked refresh token is good for at most one use. Two
    /// concurrent calls with the same token can both pass the checks
    /// before either blacklists it; that window is accepted rather than
    /// serialized here.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        if self.store.exists(&keys::blacklist_key(refresh_token)).await? {
            return Err(TokenError::Revoked);
        }

        let claims = self.verify_refresh_token(refresh_token)?;

        if !self
            .store
            .exists(&keys::refresh_token_key(refresh_token))
            .await?
        {
            return Err(TokenError::NotFound);
        }

        self.blacklist_token(refresh_token).await?;

        let pair = self.generate_token_pair(&claims.subject()).await?;

        info!(user_id = %claims.user_id, "Rotated refresh token");

        Ok(pair)
    }

    /// Blacklist a token until its natural expiry.
    ///
    /// The record's TTL is `exp - now`, so it never outlives the token
    /// itself. An already-expired token is a silent no-op: there is
    /// nothing left to protect against, and no record is written.
    pub async fn blacklist_token(&self, token: &str) -> Result<(), TokenError> {
        let claims = decode_unverified(token)
            .ok_or_else(|| TokenError::invalid("token payload could not be decoded"))?;

        let ttl = claims.exp - Utc::now().timestamp();
        if ttl <= 0 {
            return Ok(());
        }

        self.store
            .set(
                &keys::blacklist_key(token),
                "1",
                Duration::from_secs(ttl as u64),
            )
            .await
    }

    /// Blacklist every store-resident token belonging to a user.
    ///
    /// Scans the access and refresh namespaces by prefix; O(n) over all
    /// active tokens, acceptable because this is an infrequent
    /// administrative operation ("log out everywhere", compromise
    /// response). Eventually-complete, not atomic: tokens issued during
    /// the scan may be missed. Returns the number blacklisted.
    pub async fn revoke_user_tokens(&self, user_id: &str) -> Result<usize, TokenError> {
        let mut revoked = self
            .revoke_matching(keys::ACCESS_TOKEN_PREFIX, |claims| {
                claims.user_id == user_id
            })
            .await?;
        revoked += self
            .revoke_matching(keys::REFRESH_TOKEN_PREFIX, |claims| {
                claims.user_id == user_id
            })
            .await?;

        info!(user_id = %user_id, count = revoked, "Revoked all user tokens");
        Ok(revoked)
    }

    /// Blacklist every store-resident access token bound to a session.
    ///
    /// Refresh tokens are not session-scoped in this model, so only the
    /// access namespace is scanned. Returns the number blacklisted.
    pub async fn revoke_session(&self, session_id: &str) -> Result<usize, TokenError> {
        let revoked = self
            .revoke_matching(keys::ACCESS_TOKEN_PREFIX, |claims| {
                claims.session_id.as_deref() == Some(session_id)
            })
            .await?;

        info!(session_id = %session_id, count = revoked, "Revoked session tokens");
        Ok(revoked)
    }

    /// Issue a password-reset token.
    ///
    /// Self-contained: not recorded in the store and not subject to the
    /// blacklist/existence pipeline.
    pub fn generate_password_reset_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new_single_purpose(
            user_id,
            email,
            TokenType::PasswordReset,
            self.password_reset_ttl.as_secs() as i64,
            &self.issuer,
            &self.audience,
        );
        self.access_codec.encode(&claims)
    }

    /// Verify a password-reset token.
    pub fn verify_password_reset_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = self.access_codec.decode(token)?;
        assert_type(claims, TokenType::PasswordReset)
    }

    /// Issue an email-verification token.
    ///
    /// Self-contained, like password-reset tokens.
    pub fn generate_email_verification_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new_single_purpose(
            user_id,
            email,
            TokenType::EmailVerification,
            self.email_verification_ttl.as_secs() as i64,
            &self.issuer,
            &self.audience,
        );
        self.access_codec.encode(&claims)
    }

    /// Verify an email-verification token.
    pub fn verify_email_verification_token(
        &self,
        token: &str,
    ) -> Result<TokenClaims, TokenError> {
        let claims = self.access_codec.decode(token)?;
        assert_type(claims, TokenType::EmailVerification)
    }

    /// Expiry instant of a token, read without verification.
    ///
    /// Display-only; never authoritative for authorization decisions.
    pub fn token_expiry(&self, token: &str) -> Option<DateTime<Utc>> {
        decode_unverified(token).and_then(|claims| DateTime::from_timestamp(claims.exp, 0))
    }

    /// Whether a token's `exp` has passed. Undecodable tokens count as
    /// expired. Display-only.
    pub fn is_token_expired(&self, token: &str) -> bool {
        match decode_unverified(token) {
            Some(claims) => claims.is_expired(),
            None => true,
        }
    }

    /// Remaining lifetime in seconds, floored at zero. Display-only.
    pub fn token_remaining_time(&self, token: &str) -> i64 {
        decode_unverified(token)
            .map(|claims| claims.remaining_seconds())
            .unwrap_or(0)
    }

    async fn record_issuance(
        &self,
        key: &str,
        claims: &TokenClaims,
        ttl: Duration,
    ) -> Result<(), TokenError> {
        let record = serde_json::to_string(claims)
            .map_err(|e| TokenError::storage(format!("record serialization failed: {e}")))?;
        self.store.set(key, &record, ttl).await
    }

    /// Scan one namespace and blacklist every record matching the
    /// predicate. Per-key failures are logged and skipped so one bad
    /// record cannot abort the batch.
    async fn revoke_matching<F>(&self, prefix: &str, matches: F) -> Result<usize, TokenError>
    where
        F: Fn(&TokenClaims) -> bool,
    {
        let pattern = format!("{prefix}*");
        let scanned = self.store.keys(&pattern).await?;
        let now = Utc::now().timestamp();
        let mut revoked = 0;

        for key in scanned {
            let record = match self.store.get(&key).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable record in revocation scan");
                    continue;
                }
            };

            let claims: TokenClaims = match serde_json::from_str(&record) {
                Ok(claims) => claims,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping malformed record in revocation scan");
                    continue;
                }
            };

            if !matches(&claims) {
                continue;
            }

            let ttl = claims.exp - now;
            if ttl <= 0 {
                continue;
            }

            let Some(digest) = keys::digest_from_key(&key, prefix) else {
                continue;
            };

            match self
                .store
                .set(
                    &keys::blacklist_key_from_digest(digest),
                    "1",
                    Duration::from_secs(ttl as u64),
                )
                .await
            {
                Ok(()) => revoked += 1,
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to blacklist token in revocation scan");
                }
            }
        }

        Ok(revoked)
    }
}

fn assert_type(claims: TokenClaims, expected: TokenType) -> Result<TokenClaims, TokenError> {
    if claims.token_type != expected {
        return Err(TokenError::WrongType {
            expected,
            actual: claims.token_type,
        });
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn test_manager(store: MemoryStore) -> TokenManager<MemoryStore> {
        let config = TokenConfig::new("access-secret", "refresh-secret")
            .with_issuer("test-issuer")
            .with_audience("test-api");
        TokenManager::new(store, &config)
    }

    fn subject() -> TokenSubject {
        TokenSubject::new("u1", "a@b.com", "USER")
    }

    #[tokio::test]
    async fn test_pair_issuance_records_both_tokens() {
        let store = MemoryStore::new();
        let manager = test_manager(store.clone());

        let pair = manager.generate_token_pair(&subject()).await.unwrap();

        assert_eq!(pair.expires_in, 900);
        assert!(store
            .exists(&keys::access_token_key(&pair.access_token))
            .await
            .unwrap());
        assert!(store
            .exists(&keys::refresh_token_key(&pair.refresh_token))
            .await
            .unwrap());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_blacklist_expired_token_writes_nothing() {
        let store = MemoryStore::new();
        let manager = test_manager(store.clone());

        let codec = JwtCodec::new(b"access-secret", "test-issuer", "test-api");
        let claims = TokenClaims::new(&subject(), TokenType::Access, -300, "test-issuer", "test-api");
        let expired = codec.encode(&claims).unwrap();

        manager.blacklist_token(&expired).await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_blacklist_garbage_is_invalid() {
        let manager = test_manager(MemoryStore::new());

        assert!(matches!(
            manager.blacklist_token("not-a-token").await,
            Err(TokenError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_type_both_directions() {
        let manager = test_manager(MemoryStore::new());
        let pair = manager.generate_token_pair(&subject()).await.unwrap();

        assert!(matches!(
            manager.verify_access_token(&pair.refresh_token),
            // Signed with a different secret, so the signature check
            // fails before the type check is reached.
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            manager.verify_refresh_token(&pair.access_token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_type_same_secret() {
        let manager = test_manager(MemoryStore::new());
        let reset = manager
            .generate_password_reset_token("u1", "a@b.com")
            .unwrap();

        // Reset tokens share the access secret, so the signature is
        // valid and the type assertion is what rejects them.
        assert!(matches!(
            manager.verify_access_token(&reset),
            Err(TokenError::WrongType {
                expected: TokenType::Access,
                actual: TokenType::PasswordReset,
            })
        ));
    }

    #[tokio::test]
    async fn test_display_helpers() {
        let manager = test_manager(MemoryStore::new());
        let pair = manager.generate_token_pair(&subject()).await.unwrap();

        assert!(!manager.is_token_expired(&pair.access_token));
        assert!(manager.token_expiry(&pair.access_token).is_some());
        let remaining = manager.token_remaining_time(&pair.access_token);
        assert!(remaining > 0 && remaining <= 900);

        assert!(manager.is_token_expired("garbage"));
        assert!(manager.token_expiry("garbage").is_none());
        assert_eq!(manager.token_remaining_time("garbage"), 0);
    }
}
