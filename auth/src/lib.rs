//! Credential and token lifecycle library
//!
//! Provides the authentication core of the fitness backend:
//! - Password hashing (Argon2id)
//! - Signed, expiring tokens (JWT, HMAC family) with an injectable clock
//! - Access tokens and password reset tokens, each bound to its purpose
//! - An [`AuthGateway`] orchestrating login, current-user resolution and the
//!   forgot/reset/change password flows over injected storage and mail ports
//!
//! Nothing here performs I/O directly; lookups, persistence and delivery go
//! through [`CredentialStore`] and [`ResetTokenMailer`].
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Access and Reset Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::{AccessTokenService, AuthFailure, AuthSettings, PasswordResetService, SystemClock, TokenCodec};
//!
//! let settings = AuthSettings::with_defaults(b"secret_key_at_least_32_bytes_long!".to_vec()).unwrap();
//! let codec = Arc::new(TokenCodec::from_settings(&settings, Arc::new(SystemClock)));
//!
//! let access = AccessTokenService::new(Arc::clone(&codec), settings.access_token_ttl());
//! let reset = PasswordResetService::new(codec, settings.reset_token_ttl());
//!
//! let token = access.issue("user123").unwrap();
//! assert_eq!(access.validate(&token.token), Ok("user123".to_string()));
//!
//! // A reset token can never be used as a session token.
//! let reset_token = reset.issue("alice@example.com").unwrap();
//! assert_eq!(access.validate(&reset_token.token), Err(AuthFailure::TokenWrongPurpose));
//! ```

pub mod access;
pub mod clock;
pub mod errors;
pub mod gateway;
pub mod password;
pub mod ports;
pub mod reset;
pub mod settings;
pub mod token;

// Re-export commonly used items
pub use access::AccessTokenService;
pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use errors::AuthError;
pub use errors::AuthFailure;
pub use errors::MailerError;
pub use errors::StoreError;
pub use gateway::AuthGateway;
pub use gateway::ForgotPasswordAck;
pub use gateway::PasswordResetReceipt;
pub use gateway::ResetAuthorization;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use ports::Credential;
pub use ports::CredentialStore;
pub use ports::ResetTokenMailer;
pub use reset::PasswordResetService;
pub use reset::ResetTokenClaims;
pub use settings::AuthSettings;
pub use settings::SettingsError;
pub use token::Claims;
pub use token::IssuedToken;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenPurpose;
