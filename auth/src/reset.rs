use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::errors::AuthFailure;
use crate::token::Claims;
use crate::token::IssuedToken;
use crate::token::TokenCodec;
use crate::token::TokenError;
use crate::token::TokenPurpose;

const EMAIL_CLAIM: &str = "email";

/// Verified content of a password reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenClaims {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates short-lived password reset tokens bound to an email.
///
/// The service itself is stateless and cannot stop a still-valid token from
/// being replayed; callers needing single use keep a ledger keyed by
/// [`PasswordResetService::fingerprint`].
pub struct PasswordResetService {
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl PasswordResetService {
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self { codec, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a reset token for an email address.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, email: &str) -> Result<IssuedToken, TokenError> {
        let claims = Claims::for_purpose(TokenPurpose::PasswordReset).with_extra(EMAIL_CLAIM, email);
        self.codec.encode(claims, self.ttl)
    }

    /// Validate a reset token and return the email it was issued for.
    ///
    /// # Errors
    /// * `TokenMalformed` - Bad signature/structure, or no email
    /// * `TokenExpired` - Token lifetime elapsed
    /// * `TokenWrongPurpose` - Not a password reset token
    pub fn validate(&self, token: &str) -> Result<String, AuthFailure> {
        self.validate_claims(token).map(|claims| claims.email)
    }

    /// Validate a reset token and return its email and expiry.
    ///
    /// # Errors
    /// Same as [`PasswordResetService::validate`]
    pub fn validate_claims(&self, token: &str) -> Result<ResetTokenClaims, AuthFailure> {
        let claims = self.codec.decode(token)?;

        if !claims.has_purpose(TokenPurpose::PasswordReset) {
            return Err(AuthFailure::TokenWrongPurpose);
        }

        let email = claims
            .extra_str(EMAIL_CLAIM)
            .filter(|email| !email.is_empty())
            .ok_or(AuthFailure::TokenMalformed)?
            .to_string();

        let expires_at = claims
            .exp
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
            .ok_or(AuthFailure::TokenMalformed)?;

        Ok(ResetTokenClaims { email, expires_at })
    }

    /// Stable identifier of a token: its signature segment.
    ///
    /// Returns `None` for strings that are not three dot-separated segments.
    pub fn fingerprint(token: &str) -> Option<&str> {
        let mut segments = token.split('.');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(_), Some(signature), None) if !signature.is_empty() => Some(signature),
            _ => None,
        }
    }
}
