use async_trait::async_trait;
use auth::ForgotPasswordAck;
use auth::IssuedToken;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::ResetPasswordCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for account operations: sessions and the password lifecycle.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Verify a username or email with its password and issue an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown login, inactive account or wrong password
    async fn login(&self, login: &str, password: &str) -> Result<IssuedToken, AccountError>;

    /// Resolve the user behind an access token.
    ///
    /// # Errors
    /// * `TokenMalformed` / `TokenExpired` / `TokenWrongPurpose` - Token rejected
    /// * `SubjectNotFound` - Account was deleted or deactivated
    async fn current_user(&self, token: &str) -> Result<User, AccountError>;

    /// Request a password reset. The answer never depends on whether the
    /// email is registered.
    async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordAck, AccountError>;

    /// Set a new password using a reset token. Each token works once.
    ///
    /// # Errors
    /// * `TokenMalformed` / `TokenExpired` / `TokenWrongPurpose` - Token rejected
    /// * `SubjectNotFound` - No account for the token's email
    /// * `PasswordMismatch` - Confirmation differs
    /// * `InvalidPassword` - New password violates the password policy
    /// * `ResetTokenAlreadyUsed` - Token was already consumed
    /// * `Ledger` - Token could not be claimed; nothing is persisted
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AccountError>;

    /// Change the password of an authenticated user.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Current password is wrong
    /// * `PasswordMismatch` - Confirmation differs
    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError>;
}

/// Record of reset tokens that have already been redeemed.
#[async_trait]
pub trait ResetTokenLedger: Send + Sync + 'static {
    /// Atomically claim a reset token for redemption.
    ///
    /// Returns `true` for the first claim of `fingerprint` and `false` for
    /// every later one. The claim is kept until `expires_at`, after which the
    /// token is rejected on expiry alone.
    async fn try_consume(
        &self,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AccountError>;
}
