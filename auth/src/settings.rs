use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Error for invalid authentication settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Signing secret too short: minimum {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("Unsupported signing algorithm: {0} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("Token lifetime must be positive: {0}")]
    NonPositiveTtl(&'static str),

    #[error("Token lifetime out of range: {0}")]
    TtlOutOfRange(&'static str),

    #[error(
        "Reset token lifetime ({reset_minutes} min) must be shorter than access token lifetime ({access_minutes} min)"
    )]
    ResetTtlNotShorter {
        reset_minutes: i64,
        access_minutes: i64,
    },
}

/// Validated configuration shared by the token services.
///
/// Built once at startup and passed into each service at construction time.
/// The secret is never printed by `Debug`.
#[derive(Clone)]
pub struct AuthSettings {
    secret: Vec<u8>,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    reset_token_ttl: Duration,
}

impl AuthSettings {
    pub const MIN_SECRET_LENGTH: usize = 32;
    pub const DEFAULT_ALGORITHM: &'static str = "HS256";
    pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
    pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 15;

    /// Create settings from raw configuration values.
    ///
    /// # Arguments
    /// * `secret` - HMAC signing secret (at least 32 bytes)
    /// * `algorithm` - Algorithm identifier (`HS256`, `HS384` or `HS512`)
    /// * `access_token_ttl` - Lifetime of access tokens
    /// * `reset_token_ttl` - Lifetime of password reset tokens, strictly shorter
    ///
    /// # Errors
    /// * `SecretTooShort` - Secret below the minimum length
    /// * `UnsupportedAlgorithm` - Unknown or non-HMAC algorithm
    /// * `NonPositiveTtl` - A lifetime is zero or negative
    /// * `ResetTtlNotShorter` - Reset tokens would outlive access tokens
    pub fn new(
        secret: impl Into<Vec<u8>>,
        algorithm: &str,
        access_token_ttl: Duration,
        reset_token_ttl: Duration,
    ) -> Result<Self, SettingsError> {
        let secret = secret.into();
        if secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(SettingsError::SecretTooShort {
                min: Self::MIN_SECRET_LENGTH,
                actual: secret.len(),
            });
        }

        let algorithm = parse_algorithm(algorithm)?;

        if access_token_ttl <= Duration::zero() {
            return Err(SettingsError::NonPositiveTtl("access token"));
        }
        if reset_token_ttl <= Duration::zero() {
            return Err(SettingsError::NonPositiveTtl("reset token"));
        }
        if reset_token_ttl >= access_token_ttl {
            return Err(SettingsError::ResetTtlNotShorter {
                reset_minutes: reset_token_ttl.num_minutes(),
                access_minutes: access_token_ttl.num_minutes(),
            });
        }

        Ok(Self {
            secret,
            algorithm,
            access_token_ttl,
            reset_token_ttl,
        })
    }

    /// Create settings from lifetimes expressed in minutes.
    ///
    /// # Errors
    /// Same as [`AuthSettings::new`], plus `TtlOutOfRange` for lifetimes too
    /// large to represent.
    pub fn from_minutes(
        secret: impl Into<Vec<u8>>,
        algorithm: &str,
        access_token_ttl_minutes: i64,
        reset_token_ttl_minutes: i64,
    ) -> Result<Self, SettingsError> {
        let access_token_ttl = Duration::try_minutes(access_token_ttl_minutes)
            .ok_or(SettingsError::TtlOutOfRange("access token"))?;
        let reset_token_ttl = Duration::try_minutes(reset_token_ttl_minutes)
            .ok_or(SettingsError::TtlOutOfRange("reset token"))?;
        Self::new(secret, algorithm, access_token_ttl, reset_token_ttl)
    }

    /// Create settings with HS256 and the default lifetimes.
    pub fn with_defaults(secret: impl Into<Vec<u8>>) -> Result<Self, SettingsError> {
        Self::new(
            secret,
            Self::DEFAULT_ALGORITHM,
            Duration::minutes(Self::DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            Duration::minutes(Self::DEFAULT_RESET_TOKEN_TTL_MINUTES),
        )
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn reset_token_ttl(&self) -> Duration {
        self.reset_token_ttl
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"[redacted]")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .finish()
    }
}

fn parse_algorithm(identifier: &str) -> Result<Algorithm, SettingsError> {
    match Algorithm::from_str(identifier) {
        Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(algorithm),
        _ => Err(SettingsError::UnsupportedAlgorithm(identifier.to_string())),
    }
}
