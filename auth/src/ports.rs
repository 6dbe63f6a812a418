use std::fmt;

use async_trait::async_trait;

use crate::errors::MailerError;
use crate::errors::StoreError;
use crate::token::IssuedToken;

/// Stored credential of an account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub subject_id: String,
    pub email: String,
    pub password_hash: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("subject_id", &self.subject_id)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .finish()
    }
}

/// Account lookups and password persistence, implemented by the storage layer.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Account record returned when resolving the current user.
    type Subject: Send + 'static;

    /// Find the credential for a login identifier.
    ///
    /// # Errors
    /// * `StoreError` - Storage operation failed
    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, StoreError>;

    /// Find the credential registered under an email address.
    ///
    /// # Errors
    /// * `StoreError` - Storage operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    /// Find the credential of a subject.
    ///
    /// # Errors
    /// * `StoreError` - Storage operation failed
    async fn find_by_subject_id(&self, subject_id: &str)
        -> Result<Option<Credential>, StoreError>;

    /// Load the full account record of a subject.
    ///
    /// # Errors
    /// * `StoreError` - Storage operation failed
    async fn load_subject(&self, subject_id: &str) -> Result<Option<Self::Subject>, StoreError>;

    /// Replace the stored password hash of a subject.
    ///
    /// # Errors
    /// * `StoreError` - Storage operation failed or subject vanished
    async fn update_password_hash(
        &self,
        subject_id: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;
}

/// Out-of-band delivery of password reset tokens (e.g. email).
#[async_trait]
pub trait ResetTokenMailer: Send + Sync + 'static {
    /// Deliver a reset token to the owner of `email`.
    ///
    /// # Errors
    /// * `MailerError` - Delivery failed
    async fn send_reset_token(&self, email: &str, token: &IssuedToken) -> Result<(), MailerError>;
}
