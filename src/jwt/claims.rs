use serde::{Deserialize, Serialize};

/// Token purpose discriminator.
///
/// A token verified for one purpose must carry the matching type; a
/// mismatch is a hard validation failure, not a soft warning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived credential authorizing API requests.
    Access,
    /// Long-lived credential used solely to mint new token pairs.
    Refresh,
    /// Single-purpose token for password reset flows.
    PasswordReset,
    /// Single-purpose token for email verification flows.
    EmailVerification,
}

impl TokenType {
    /// Wire name of the type, as embedded in the `type` claim.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::PasswordReset => "password_reset",
            Self::EmailVerification => "email_verification",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal identity carried into token issuance.
///
/// The payload without `type`/`iat`/`exp`; those are set at signing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    /// Opaque identifier of the principal.
    pub user_id: String,
    /// Principal's email, carried so validation does not re-fetch it.
    pub email: String,
    /// Authorization role.
    pub role: String,
    /// Login-session correlation id, enabling per-session revocation.
    pub session_id: Option<String>,
}

impl TokenSubject {
    /// Create a subject without a session binding.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        TokenSubject {
            user_id: user_id.into(),
            email: email.into(),
            role: role.into(),
            session_id: None,
        }
    }

    /// Bind the subject to a login session.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Signed content of a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Opaque identifier of the principal.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Principal's email.
    pub email: String,
    /// Authorization role; absent on reset/verification tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Login-session correlation id.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Token purpose discriminator.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Unique token id.
    pub jti: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Issuer, validated exactly on verification.
    pub iss: String,
    /// Audience, validated exactly on verification.
    pub aud: String,
}

impl TokenClaims {
    /// Build claims for a subject, computing `iat`/`exp` from the TTL.
    ///
    /// A negative TTL produces an already-expired token; useful in tests.
    pub fn new(
        subject: &TokenSubject,
        token_type: TokenType,
        ttl_seconds: i64,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        TokenClaims {
            user_id: subject.user_id.clone(),
            email: subject.email.clone(),
            role: Some(subject.role.clone()),
            session_id: subject.session_id.clone(),
            token_type,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_seconds,
            iss: issuer.into(),
            aud: audience.into(),
        }
    }

    /// Build claims for a single-purpose token carrying no role or session.
    pub fn new_single_purpose(
        user_id: impl Into<String>,
        email: impl Into<String>,
        token_type: TokenType,
        ttl_seconds: i64,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        TokenClaims {
            user_id: user_id.into(),
            email: email.into(),
            role: None,
            session_id: None,
            token_type,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_seconds,
            iss: issuer.into(),
            aud: audience.into(),
        }
    }

    /// Recover the issuance subject from the claims.
    #[must_use]
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            role: self.role.clone().unwrap_or_default(),
            session_id: self.session_id.clone(),
        }
    }

    /// Whether `exp` is in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }

    /// Remaining lifetime in seconds, floored at zero.
    #[must_use]
    pub fn remaining_seconds(&self) -> i64 {
        (self.exp - chrono::Utc::now().timestamp()).max(0)
    }
}
