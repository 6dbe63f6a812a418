use auth::AuthFailure;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::AccountError;
use crate::account::models::ChangePasswordCommand;
use crate::account::ports::AccountServicePort;
use crate::domain::user::models::Password;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequestBody>,
) -> Result<ApiSuccess<()>, ApiError> {
    let command = body.try_into_command()?;

    state
        .account_service
        .change_password(&current_user.user_id, command)
        .await
        .map_err(|e| match e.failure() {
            // A wrong current password must not read as an expired session.
            Some(AuthFailure::InvalidCredentials) => {
                ApiError::BadRequest("Current password is incorrect".to_string())
            }
            _ => ApiError::from(e),
        })
        .map(|_| ApiSuccess::new(StatusCode::NO_CONTENT, ()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequestBody {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

impl ChangePasswordRequestBody {
    fn try_into_command(self) -> Result<ChangePasswordCommand, AccountError> {
        Ok(ChangePasswordCommand {
            current_password: self.current_password,
            new_password: Password::new(self.new_password)?,
            confirm_password: self.confirm_password,
        })
    }
}
