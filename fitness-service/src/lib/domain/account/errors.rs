use auth::AuthError;
use auth::AuthFailure;
use thiserror::Error;

use crate::user::errors::PasswordPolicyError;

/// Top-level error for account flows (login, session, password lifecycle)
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Reset token has already been used")]
    ResetTokenAlreadyUsed,

    #[error("Reset token ledger error: {0}")]
    Ledger(String),
}

impl AccountError {
    /// The authentication failure behind this error, if it is one.
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            AccountError::Auth(err) => err.failure(),
            _ => None,
        }
    }
}

impl From<AuthFailure> for AccountError {
    fn from(failure: AuthFailure) -> Self {
        AccountError::Auth(AuthError::Failure(failure))
    }
}
