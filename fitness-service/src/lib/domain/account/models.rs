use std::fmt;

use crate::user::models::Password;

/// Command to complete a password reset
///
/// The new password is checked against the policy only once the token has
/// been accepted.
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for ResetPasswordCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordCommand")
            .field("token", &"[redacted]")
            .field("new_password", &"[redacted]")
            .field("confirm_password", &"[redacted]")
            .finish()
    }
}

/// Command to change the password of the authenticated user
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: Password,
    pub confirm_password: String,
}
