use thiserror::Error;

/// Error type for password hashing.
///
/// Verification never fails with an error: a malformed stored hash simply
/// does not verify.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid work factor: {0}")]
    InvalidParameters(String),
}
