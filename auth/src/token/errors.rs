use thiserror::Error;

/// Error type for token issuance.
///
/// Rejections on the decoding side are reported as
/// [`AuthFailure`](crate::errors::AuthFailure) instead.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),
}
