use async_trait::async_trait;
use auth::IssuedToken;
use auth::MailerError;
use auth::ResetTokenMailer;

/// Reset token delivery for development deployments without an email relay.
///
/// Records the dispatch at info level. The token itself is only emitted at
/// trace level, below every filter the service ships with.
#[derive(Debug, Default, Clone)]
pub struct LogResetMailer;

impl LogResetMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResetTokenMailer for LogResetMailer {
    async fn send_reset_token(&self, email: &str, token: &IssuedToken) -> Result<(), MailerError> {
        tracing::info!(
            recipient = %email,
            expires_at = %token.expires_at,
            "Password reset email queued"
        );
        tracing::trace!(recipient = %email, token = %token.token, "Password reset token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;
    use std::sync::Mutex;

    use chrono::Utc;
    use tracing::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn issued(token: &str) -> IssuedToken {
        IssuedToken {
            token: token.to_string(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_send_reset_token_succeeds() {
        assert!(LogResetMailer::new()
            .send_reset_token("tricepa@fit.com", &issued("a.b.c"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_token_absent_from_debug_logs() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        LogResetMailer::new()
            .send_reset_token("tricepa@fit.com", &issued("header.payload.signature"))
            .await
            .unwrap();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Password reset email queued"));
        assert!(!output.contains("header.payload.signature"));
    }
}
