use std::sync::Arc;

use chrono::Duration;

use crate::errors::AuthFailure;
use crate::token::Claims;
use crate::token::IssuedToken;
use crate::token::TokenCodec;
use crate::token::TokenError;
use crate::token::TokenPurpose;

/// Issues and validates bearer tokens identifying a user session.
///
/// Tokens are stateless: a validly signed, unexpired access token is always
/// accepted.
pub struct AccessTokenService {
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl AccessTokenService {
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self { codec, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue an access token for a subject.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, subject_id: &str) -> Result<IssuedToken, TokenError> {
        let claims = Claims::for_purpose(TokenPurpose::Access).with_subject(subject_id);
        self.codec.encode(claims, self.ttl)
    }

    /// Validate an access token and return its subject.
    ///
    /// # Errors
    /// * `TokenMalformed` - Bad signature/structure, or no subject
    /// * `TokenExpired` - Token lifetime elapsed
    /// * `TokenWrongPurpose` - Token was minted for another flow
    pub fn validate(&self, token: &str) -> Result<String, AuthFailure> {
        let claims = self.codec.decode(token)?;

        if !claims.has_purpose(TokenPurpose::Access) {
            return Err(AuthFailure::TokenWrongPurpose);
        }

        claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthFailure::TokenMalformed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use chrono::TimeZone;
    use chrono::Utc;
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::clock::ManualClock;
    use crate::reset::PasswordResetService;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn service_with_clock() -> (AccessTokenService, Arc<TokenCodec>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let codec = Arc::new(TokenCodec::new(SECRET, Algorithm::HS256, clock.clone()));
        let service = AccessTokenService::new(Arc::clone(&codec), Duration::minutes(30));
        (service, codec, clock)
    }

    #[test]
    fn test_issue_then_validate_returns_subject() {
        let (service, _, _) = service_with_clock();

        let issued = service.issue("user123").expect("Failed to issue token");
        assert_eq!(issued.expires_at - issued.issued_at, Duration::minutes(30));

        assert_eq!(service.validate(&issued.token), Ok("user123".to_string()));
    }

    #[test]
    fn test_expired_after_ttl() {
        let (service, _, clock) = service_with_clock();
        let issued = service.issue("user123").expect("Failed to issue token");

        clock.advance(Duration::minutes(30) - Duration::seconds(1));
        assert_eq!(service.validate(&issued.token), Ok("user123".to_string()));

        clock.advance(Duration::seconds(2));
        assert_eq!(
            service.validate(&issued.token),
            Err(AuthFailure::TokenExpired)
        );
    }

    #[test]
    fn test_token_from_other_secret_is_malformed() {
        let (service, _, clock) = service_with_clock();
        let foreign_codec = Arc::new(TokenCodec::new(
            b"another_secret_key_at_least_32_bytes",
            Algorithm::HS256,
            clock,
        ));
        let foreign = AccessTokenService::new(foreign_codec, Duration::minutes(30));

        let issued = foreign.issue("admin").expect("Failed to issue token");

        assert_eq!(
            service.validate(&issued.token),
            Err(AuthFailure::TokenMalformed)
        );
    }

    #[test]
    fn test_reset_token_rejected_with_wrong_purpose() {
        let (service, codec, _) = service_with_clock();
        let reset_service = PasswordResetService::new(codec, Duration::minutes(15));

        let reset = reset_service
            .issue("a@b.com")
            .expect("Failed to issue token");

        assert_eq!(
            service.validate(&reset.token),
            Err(AuthFailure::TokenWrongPurpose)
        );
    }

    #[test]
    fn test_missing_subject_is_malformed() {
        let (service, codec, _) = service_with_clock();
        let issued = codec
            .encode(Claims::for_purpose(TokenPurpose::Access), Duration::minutes(5))
            .expect("Failed to encode token");

        assert_eq!(
            service.validate(&issued.token),
            Err(AuthFailure::TokenMalformed)
        );
    }

    #[test]
    fn test_token_without_purpose_is_wrong_purpose() {
        let (service, codec, _) = service_with_clock();
        let issued = codec
            .encode(Claims::new().with_subject("user123"), Duration::minutes(5))
            .expect("Failed to encode token");

        assert_eq!(
            service.validate(&issued.token),
            Err(AuthFailure::TokenWrongPurpose)
        );
    }
}
