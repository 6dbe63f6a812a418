use std::sync::Arc;
use std::sync::OnceLock;

use chrono::DateTime;
use chrono::Utc;

use crate::access::AccessTokenService;
use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::errors::AuthError;
use crate::errors::AuthFailure;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::ports::CredentialStore;
use crate::ports::ResetTokenMailer;
use crate::reset::PasswordResetService;
use crate::settings::AuthSettings;
use crate::token::IssuedToken;
use crate::token::TokenCodec;

/// Message returned by every forgot-password request.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, password reset instructions have been sent";

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Acknowledgment of a forgot-password request.
///
/// Identical whether or not the email belongs to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgotPasswordAck {
    pub message: &'static str,
}

impl Default for ForgotPasswordAck {
    fn default() -> Self {
        Self {
            message: FORGOT_PASSWORD_MESSAGE,
        }
    }
}

/// Outcome of a completed password reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetReceipt {
    pub subject_id: String,
    /// Expiry of the consumed reset token
    pub token_expires_at: DateTime<Utc>,
}

/// A reset request whose token, account and confirmation have been checked.
///
/// Only produced by [`AuthGateway::authorize_reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetAuthorization {
    subject_id: String,
    token_expires_at: DateTime<Utc>,
}

impl ResetAuthorization {
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn token_expires_at(&self) -> DateTime<Utc> {
        self.token_expires_at
    }
}

/// Authentication façade consumed by request handlers.
///
/// Coordinates password hashing and the two token services with the injected
/// credential store and reset token mailer. Knows nothing about transport.
pub struct AuthGateway<S, M>
where
    S: CredentialStore,
    M: ResetTokenMailer,
{
    store: Arc<S>,
    mailer: Arc<M>,
    hasher: PasswordHasher,
    access_tokens: AccessTokenService,
    reset_tokens: PasswordResetService,
    decoy_hash: OnceLock<String>,
}

impl<S, M> AuthGateway<S, M>
where
    S: CredentialStore,
    M: ResetTokenMailer,
{
    /// Create a gateway using the system clock.
    ///
    /// # Arguments
    /// * `settings` - Validated secret, algorithm and token lifetimes
    /// * `store` - Credential lookups and password persistence
    /// * `mailer` - Out-of-band reset token delivery
    pub fn new(settings: &AuthSettings, store: Arc<S>, mailer: Arc<M>) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock), store, mailer)
    }

    /// Create a gateway with an explicit time source.
    pub fn with_clock(
        settings: &AuthSettings,
        clock: Arc<dyn Clock>,
        store: Arc<S>,
        mailer: Arc<M>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::from_settings(settings, clock));

        Self {
            store,
            mailer,
            hasher: PasswordHasher::new(),
            access_tokens: AccessTokenService::new(
                Arc::clone(&codec),
                settings.access_token_ttl(),
            ),
            reset_tokens: PasswordResetService::new(codec, settings.reset_token_ttl()),
            decoy_hash: OnceLock::new(),
        }
    }

    /// Replace the password hasher (e.g. to tune the work factor).
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self.decoy_hash = OnceLock::new();
        self
    }

    pub fn access_tokens(&self) -> &AccessTokenService {
        &self.access_tokens
    }

    pub fn reset_tokens(&self) -> &PasswordResetService {
        &self.reset_tokens
    }

    /// Hash a password for storage (registration).
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.hasher.hash(password)
    }

    /// Verify credentials and issue an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown login or wrong password
    /// * `Store` - Credential lookup failed
    /// * `Token` - Token signing failed
    pub async fn login(&self, login: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let Some(credential) = self.store.find_by_login(login).await? else {
            // Pay for one verification anyway so unknown logins are not faster.
            self.verify_against_decoy(password);
            tracing::debug!("Login rejected: unknown account");
            return Err(AuthFailure::InvalidCredentials.into());
        };

        if !self.hasher.verify(password, &credential.password_hash) {
            tracing::debug!(subject_id = %credential.subject_id, "Login rejected: wrong password");
            return Err(AuthFailure::InvalidCredentials.into());
        }

        let token = self.access_tokens.issue(&credential.subject_id)?;
        tracing::info!(
            subject_id = %credential.subject_id,
            expires_at = %token.expires_at,
            "Access token issued"
        );

        Ok(token)
    }

    /// Resolve the account behind an access token.
    ///
    /// # Errors
    /// * `TokenMalformed` / `TokenExpired` / `TokenWrongPurpose` - Token rejected
    /// * `SubjectNotFound` - Token is valid but the account no longer exists
    /// * `Store` - Subject lookup failed
    pub async fn resolve_current_user(&self, token: &str) -> Result<S::Subject, AuthError> {
        let subject_id = self.access_tokens.validate(token)?;

        match self.store.load_subject(&subject_id).await? {
            Some(subject) => Ok(subject),
            None => {
                tracing::warn!(subject_id = %subject_id, "Valid access token for unknown subject");
                Err(AuthFailure::SubjectNotFound.into())
            }
        }
    }

    /// Start a password reset.
    ///
    /// Always answers with the same acknowledgment. A reset token is minted
    /// on both paths and only delivered when the email belongs to an account;
    /// it is never part of the response.
    ///
    /// # Errors
    /// * `Store` - Account lookup failed
    /// * `Token` - Token signing failed
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordAck, AuthError> {
        let account = self.store.find_by_email(email).await?;
        let bound_email = account
            .as_ref()
            .map_or(email, |credential| credential.email.as_str());
        let token = self.reset_tokens.issue(bound_email)?;

        match account {
            Some(credential) => {
                match self.mailer.send_reset_token(&credential.email, &token).await {
                    Ok(()) => tracing::info!(
                        subject_id = %credential.subject_id,
                        expires_at = %token.expires_at,
                        "Password reset token dispatched"
                    ),
                    Err(e) => tracing::error!(
                        subject_id = %credential.subject_id,
                        error = %e,
                        "Failed to deliver password reset token"
                    ),
                }
            }
            None => tracing::debug!("Password reset requested for unknown email"),
        }

        Ok(ForgotPasswordAck::default())
    }

    /// Complete a password reset.
    ///
    /// Equivalent to [`AuthGateway::authorize_reset`] followed by
    /// [`AuthGateway::complete_reset`].
    ///
    /// # Errors
    /// * `TokenMalformed` / `TokenExpired` / `TokenWrongPurpose` - Reset token rejected
    /// * `SubjectNotFound` - No account for the token's email
    /// * `PasswordMismatch` - Confirmation differs; nothing is persisted
    /// * `Password` / `Store` - Hashing or persistence failed
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<PasswordResetReceipt, AuthError> {
        let authorization = self
            .authorize_reset(token, new_password, confirm_password)
            .await?;
        self.complete_reset(authorization, new_password).await
    }

    /// Check a reset request without changing anything.
    ///
    /// Validates the token, resolves the account and compares the two
    /// passwords. Callers enforcing single use claim the token between this
    /// step and [`AuthGateway::complete_reset`].
    ///
    /// # Errors
    /// * `TokenMalformed` / `TokenExpired` / `TokenWrongPurpose` - Reset token rejected
    /// * `SubjectNotFound` - No account for the token's email
    /// * `PasswordMismatch` - Confirmation differs
    /// * `Store` - Account lookup failed
    pub async fn authorize_reset(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<ResetAuthorization, AuthError> {
        let claims = self.reset_tokens.validate_claims(token)?;

        let credential = self
            .store
            .find_by_email(&claims.email)
            .await?
            .ok_or(AuthError::Failure(AuthFailure::SubjectNotFound))?;

        if new_password != confirm_password {
            return Err(AuthFailure::PasswordMismatch.into());
        }

        Ok(ResetAuthorization {
            subject_id: credential.subject_id,
            token_expires_at: claims.expires_at,
        })
    }

    /// Hash and persist the new password of an authorized reset.
    ///
    /// # Errors
    /// * `Password` / `Store` - Hashing or persistence failed
    pub async fn complete_reset(
        &self,
        authorization: ResetAuthorization,
        new_password: &str,
    ) -> Result<PasswordResetReceipt, AuthError> {
        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .update_password_hash(&authorization.subject_id, &password_hash)
            .await?;

        tracing::info!(subject_id = %authorization.subject_id, "Password reset completed");

        Ok(PasswordResetReceipt {
            subject_id: authorization.subject_id,
            token_expires_at: authorization.token_expires_at,
        })
    }

    /// Change the password of an authenticated subject.
    ///
    /// # Errors
    /// * `SubjectNotFound` - Account does not exist
    /// * `InvalidCredentials` - Current password is wrong
    /// * `PasswordMismatch` - Confirmation differs; nothing is persisted
    /// * `Password` / `Store` - Hashing or persistence failed
    pub async fn change_password(
        &self,
        subject_id: &str,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let credential = self
            .store
            .find_by_subject_id(subject_id)
            .await?
            .ok_or(AuthError::Failure(AuthFailure::SubjectNotFound))?;

        if !self.hasher.verify(current_password, &credential.password_hash) {
            tracing::debug!(subject_id = %subject_id, "Password change rejected: wrong current password");
            return Err(AuthFailure::InvalidCredentials.into());
        }

        if new_password != confirm_password {
            return Err(AuthFailure::PasswordMismatch.into());
        }

        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .update_password_hash(&credential.subject_id, &password_hash)
            .await?;

        tracing::info!(subject_id = %subject_id, "Password changed");

        Ok(())
    }

    fn verify_against_decoy(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.hasher.hash(DECOY_PASSWORD).unwrap_or_default());
        let _ = self.hasher.verify(password, decoy);
    }
}
