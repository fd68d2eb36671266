//! Configuration for the token lifecycle manager.
//!
//! Loaded from environment variables at startup, with builder-style
//! overrides for tests and embedding.

use crate::error::TokenError;
use std::env;
use std::time::Duration;
use zeroize::Zeroizing;

/// Signing secret with a redacted `Debug` and zeroize-on-drop storage.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        SecretString(Zeroizing::new(secret.into()))
    }

    /// Secret bytes for key derivation.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        SecretString::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        SecretString::new(value)
    }
}

/// Token lifecycle configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for access tokens (also covers reset/verification tokens).
    pub access_secret: SecretString,
    /// Secret for refresh tokens.
    pub refresh_secret: SecretString,
    /// Issuer claim, validated exactly on verification.
    pub issuer: String,
    /// Audience claim, validated exactly on verification.
    pub audience: String,
    /// Access token TTL.
    pub access_token_ttl: Duration,
    /// Refresh token TTL.
    pub refresh_token_ttl: Duration,
    /// Password-reset token TTL.
    pub password_reset_ttl: Duration,
    /// Email-verification token TTL.
    pub email_verification_ttl: Duration,
    /// Redis connection URL for the backing store.
    pub redis_url: String,
}

impl TokenConfig {
    /// Create a configuration with default TTLs, issuer and audience.
    pub fn new(access_secret: impl Into<SecretString>, refresh_secret: impl Into<SecretString>) -> Self {
        TokenConfig {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            issuer: "auth-platform".to_string(),
            audience: "auth-platform-api".to_string(),
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(604_800),
            password_reset_ttl: Duration::from_secs(3_600),
            email_verification_ttl: Duration::from_secs(86_400),
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }

    /// Override the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Override the audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Override the access token TTL.
    #[must_use]
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Override the refresh token TTL.
    #[must_use]
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Override the Redis URL.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a secret is missing or a variable fails to
    /// parse.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let access_secret = env::var("JWT_ACCESS_SECRET")
            .map_err(|_| TokenError::config("JWT_ACCESS_SECRET is required"))?;
        let refresh_secret = env::var("JWT_REFRESH_SECRET")
            .map_err(|_| TokenError::config("JWT_REFRESH_SECRET is required"))?;

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "auth-platform".to_string());
        let audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "auth-platform-api".to_string());

        let access_token_ttl = Duration::from_secs(parse_env("ACCESS_TOKEN_TTL", 900)?);
        let refresh_token_ttl = Duration::from_secs(parse_env("REFRESH_TOKEN_TTL", 604_800)?);
        let password_reset_ttl = Duration::from_secs(parse_env("PASSWORD_RESET_TOKEN_TTL", 3_600)?);
        let email_verification_ttl =
            Duration::from_secs(parse_env("EMAIL_VERIFICATION_TOKEN_TTL", 86_400)?);

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        Ok(TokenConfig {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            issuer,
            audience,
            access_token_ttl,
            refresh_token_ttl,
            password_reset_ttl,
            email_verification_ttl,
            redis_url,
        })
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
