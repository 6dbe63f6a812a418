use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::ResetPasswordCommand;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequestBody>,
) -> Result<ApiSuccess<ResetPasswordResponseData>, ApiError> {
    state
        .account_service
        .reset_password(body.into())
        .await
        .map_err(|e| match ApiError::from(e) {
            // The reset token is a request field, not a credential of the caller.
            ApiError::Unauthorized(msg) => ApiError::BadRequest(msg),
            other => other,
        })?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ResetPasswordResponseData {
            message: "Password has been reset".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequestBody {
    token: String,
    new_password: String,
    confirm_password: String,
}

// Password policy is checked by the service once the token is known good.
impl From<ResetPasswordRequestBody> for ResetPasswordCommand {
    fn from(body: ResetPasswordRequestBody) -> Self {
        ResetPasswordCommand {
            token: body.token,
            new_password: body.new_password,
            confirm_password: body.confirm_password,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPasswordResponseData {
    pub message: String,
}
