use std::sync::Arc;

use async_trait::async_trait;
use auth::IssuedToken;
use auth::MailerError;
use auth::ResetTokenMailer;

/// Hands reset tokens to the wrapped mailer on a background task.
///
/// `send_reset_token` returns as soon as the delivery is scheduled, so a
/// forgot-password request for a registered email takes as long as one for
/// an unknown email. Delivery failures are logged by the background task.
pub struct DetachedMailer<M>
where
    M: ResetTokenMailer,
{
    inner: Arc<M>,
}

impl<M> DetachedMailer<M>
where
    M: ResetTokenMailer,
{
    pub fn new(inner: Arc<M>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<M> ResetTokenMailer for DetachedMailer<M>
where
    M: ResetTokenMailer,
{
    async fn send_reset_token(&self, email: &str, token: &IssuedToken) -> Result<(), MailerError> {
        let inner = Arc::clone(&self.inner);
        let email = email.to_string();
        let token = token.clone();

        tokio::spawn(async move {
            if let Err(e) = inner.send_reset_token(&email, &token).await {
                tracing::error!(error = %e, "Failed to deliver password reset token");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;
    use std::time::Instant;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct SlowMailer {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ResetTokenMailer for SlowMailer {
        async fn send_reset_token(
            &self,
            email: &str,
            _token: &IssuedToken,
        ) -> Result<(), MailerError> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.delivered.lock().unwrap().push(email.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_returns_before_delivery_completes() {
        let slow = Arc::new(SlowMailer::default());
        let mailer = DetachedMailer::new(Arc::clone(&slow));
        let token = IssuedToken {
            token: "a.b.c".to_string(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
        };

        let started = Instant::now();
        mailer
            .send_reset_token("tricepa@fit.com", &token)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(slow.delivered.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            *slow.delivered.lock().unwrap(),
            vec!["tricepa@fit.com".to_string()]
        );
    }
}
