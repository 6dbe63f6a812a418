use thiserror::Error;

use crate::password::PasswordError;
use crate::token::TokenError;

/// Caller-visible outcome of a rejected authentication step.
///
/// These are expected conditions, not faults: the routing layer maps each one
/// to a transport status. Signature and claim problems are reported apart
/// from expiry for diagnostics, but all of them reject.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is malformed or has an invalid signature")]
    TokenMalformed,

    #[error("Token was issued for a different purpose")]
    TokenWrongPurpose,

    #[error("No account matches the token subject")]
    SubjectNotFound,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Error reported by an injected credential store.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl ToString) -> Self {
        Self(message.to_string())
    }
}

/// Error reported by an injected reset token mailer.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct MailerError(pub String);

impl MailerError {
    pub fn new(message: impl ToString) -> Self {
        Self(message.to_string())
    }
}

/// Top-level error for gateway operations.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error(transparent)]
    Failure(#[from] AuthFailure),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// The expected failure behind this error, if it is one.
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            AuthError::Failure(failure) => Some(*failure),
            _ => None,
        }
    }
}
