use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;
use crate::clock::Clock;
use crate::errors::AuthFailure;
use crate::settings::AuthSettings;

/// A freshly signed token together with its validity window.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[redacted]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Signed, expiring token encoder/decoder.
///
/// Tokens are compact JWTs signed with an HMAC algorithm. Expiry is checked
/// against the injected [`Clock`] rather than the system time, with no leeway.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a new codec.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `algorithm` - HMAC algorithm used to sign and required when verifying
    /// * `clock` - Time source for `iat`/`exp` stamping and expiry checks
    pub fn new(secret: &[u8], algorithm: Algorithm, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            clock,
        }
    }

    pub fn from_settings(settings: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self::new(settings.secret(), settings.algorithm(), clock)
    }

    /// Sign claims into a token valid for `ttl` from now.
    ///
    /// # Arguments
    /// * `claims` - Claims to encode; `iat` and `exp` are overwritten
    /// * `ttl` - Validity window
    ///
    /// # Errors
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn encode(&self, claims: Claims, ttl: Duration) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + ttl;

        let claims = claims
            .with_issued_at(issued_at.timestamp())
            .with_expiration(expires_at.timestamp());

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token and return its claims.
    ///
    /// The signature is checked before any claim is looked at, so forged
    /// payloads are rejected without being inspected.
    ///
    /// # Errors
    /// * `TokenMalformed` - Bad structure, wrong algorithm, bad signature, or no `exp`
    /// * `TokenExpired` - `now` is past `exp`
    pub fn decode(&self, token: &str) -> Result<Claims, AuthFailure> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is enforced below against the injected clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected during verification");
                AuthFailure::TokenMalformed
            })?
            .claims;

        if claims.exp.is_none() {
            tracing::debug!("Token rejected: missing exp claim");
            return Err(AuthFailure::TokenMalformed);
        }

        if claims.is_expired(self.clock.now().timestamp()) {
            return Err(AuthFailure::TokenExpired);
        }

        Ok(claims)
    }
}
