use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthFailure;
use auth::AuthGateway;
use auth::AuthSettings;
use auth::Clock;
use auth::ForgotPasswordAck;
use auth::IssuedToken;
use auth::PasswordHasher;
use auth::PasswordResetService;
use auth::ResetTokenMailer;

use crate::account::credentials::RepositoryCredentialStore;
use crate::account::delivery::DetachedMailer;
use crate::account::errors::AccountError;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::ResetPasswordCommand;
use crate::account::ports::AccountServicePort;
use crate::account::ports::ResetTokenLedger;
use crate::domain::user::models::Password;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// Domain service implementation for account operations.
///
/// Delegates credential checks and token handling to the [`AuthGateway`] and
/// adds single use of reset tokens on top of it. Reset tokens are delivered
/// off the request path.
pub struct AccountService<UR, M, L>
where
    UR: UserRepository,
    M: ResetTokenMailer,
    L: ResetTokenLedger,
{
    gateway: AuthGateway<RepositoryCredentialStore<UR>, DetachedMailer<M>>,
    ledger: Arc<L>,
}

impl<UR, M, L> AccountService<UR, M, L>
where
    UR: UserRepository,
    M: ResetTokenMailer,
    L: ResetTokenLedger,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `settings` - Token secret, algorithm and lifetimes
    /// * `repository` - User persistence implementation
    /// * `mailer` - Reset token delivery
    /// * `ledger` - Consumed reset token record
    pub fn new(
        settings: &AuthSettings,
        repository: Arc<UR>,
        mailer: Arc<M>,
        ledger: Arc<L>,
    ) -> Self {
        Self {
            gateway: AuthGateway::new(
                settings,
                Arc::new(RepositoryCredentialStore::new(repository)),
                Arc::new(DetachedMailer::new(mailer)),
            ),
            ledger,
        }
    }

    /// Same as [`AccountService::new`] with an explicit time source.
    pub fn with_clock(
        settings: &AuthSettings,
        clock: Arc<dyn Clock>,
        repository: Arc<UR>,
        mailer: Arc<M>,
        ledger: Arc<L>,
    ) -> Self {
        Self {
            gateway: AuthGateway::with_clock(
                settings,
                clock,
                Arc::new(RepositoryCredentialStore::new(repository)),
                Arc::new(DetachedMailer::new(mailer)),
            ),
            ledger,
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.gateway = self.gateway.with_hasher(hasher);
        self
    }
}

#[async_trait]
impl<UR, M, L> AccountServicePort for AccountService<UR, M, L>
where
    UR: UserRepository,
    M: ResetTokenMailer,
    L: ResetTokenLedger,
{
    async fn login(&self, login: &str, password: &str) -> Result<IssuedToken, AccountError> {
        Ok(self.gateway.login(login, password).await?)
    }

    async fn current_user(&self, token: &str) -> Result<User, AccountError> {
        Ok(self.gateway.resolve_current_user(token).await?)
    }

    async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordAck, AccountError> {
        Ok(self.gateway.forgot_password(email).await?)
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AccountError> {
        let fingerprint =
            PasswordResetService::fingerprint(&command.token).ok_or(AuthFailure::TokenMalformed)?;

        let authorization = self
            .gateway
            .authorize_reset(
                &command.token,
                &command.new_password,
                &command.confirm_password,
            )
            .await?;
        let new_password = Password::new(command.new_password)?;

        // Claimed before anything is persisted; a token that cannot be
        // claimed is never redeemed.
        let claimed = self
            .ledger
            .try_consume(fingerprint, authorization.token_expires_at())
            .await
            .map_err(|e| {
                tracing::error!(
                    subject_id = %authorization.subject_id(),
                    error = %e,
                    "Failed to claim reset token"
                );
                e
            })?;
        if !claimed {
            tracing::warn!(
                subject_id = %authorization.subject_id(),
                "Rejected replay of a consumed reset token"
            );
            return Err(AccountError::ResetTokenAlreadyUsed);
        }

        self.gateway
            .complete_reset(authorization, new_password.expose())
            .await?;
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError> {
        self.gateway
            .change_password(
                &user_id.to_string(),
                &command.current_password,
                command.new_password.expose(),
                &command.confirm_password,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use auth::MailerError;
    use auth::ManualClock;
    use chrono::DateTime;
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::DifficultyLevel;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::Username;
    use crate::outbound::repositories::memory::InMemoryResetLedger;
    use crate::outbound::repositories::memory::InMemoryUserRepository;

    const SECRET: &[u8] = b"account-service-test-secret-32-bytes!!";

    #[derive(Default)]
    struct CapturingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl CapturingMailer {
        fn last_token_for(&self, email: &str) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, token)| token.clone())
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        async fn wait_for_token(&self, email: &str) -> String {
            for _ in 0..200 {
                if let Some(token) = self.last_token_for(email) {
                    return token;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            panic!("no reset token delivered to {email}");
        }
    }

    #[async_trait]
    impl ResetTokenMailer for CapturingMailer {
        async fn send_reset_token(
            &self,
            email: &str,
            token: &IssuedToken,
        ) -> Result<(), MailerError> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), token.token.clone()));
            Ok(())
        }
    }

    struct SlowMailer;

    #[async_trait]
    impl ResetTokenMailer for SlowMailer {
        async fn send_reset_token(
            &self,
            _email: &str,
            _token: &IssuedToken,
        ) -> Result<(), MailerError> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            Ok(())
        }
    }

    /// Yields to the scheduler before claiming, like a database round trip.
    #[derive(Default)]
    struct YieldingLedger {
        inner: InMemoryResetLedger,
    }

    #[async_trait]
    impl ResetTokenLedger for YieldingLedger {
        async fn try_consume(
            &self,
            fingerprint: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<bool, AccountError> {
            tokio::task::yield_now().await;
            self.inner.try_consume(fingerprint, expires_at).await
        }
    }

    mock! {
        pub TestLedger {}

        #[async_trait]
        impl ResetTokenLedger for TestLedger {
            async fn try_consume(&self, fingerprint: &str, expires_at: DateTime<Utc>) -> Result<bool, AccountError>;
        }
    }

    struct Harness<L: ResetTokenLedger> {
        service: AccountService<InMemoryUserRepository, CapturingMailer, L>,
        repository: Arc<InMemoryUserRepository>,
        mailer: Arc<CapturingMailer>,
        clock: Arc<ManualClock>,
        hasher: PasswordHasher,
    }

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_work_factor(8, 1, 1).unwrap()
    }

    fn harness_with<L: ResetTokenLedger>(ledger: L) -> Harness<L> {
        let settings = AuthSettings::with_defaults(SECRET).unwrap();
        let repository = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(CapturingMailer::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let hasher = fast_hasher();

        let service = AccountService::with_clock(
            &settings,
            clock.clone(),
            Arc::clone(&repository),
            Arc::clone(&mailer),
            Arc::new(ledger),
        )
        .with_hasher(hasher.clone());

        Harness {
            service,
            repository,
            mailer,
            clock,
            hasher,
        }
    }

    fn harness() -> Harness<InMemoryResetLedger> {
        harness_with(InMemoryResetLedger::new())
    }

    fn new_user(username: &str, email: &str, password_hash: String) -> User {
        User {
            id: UserId::new(),
            username: Username::new(username.to_string()).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash,
            difficulty_level: DifficultyLevel::Beginner,
            total_points: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    impl<L: ResetTokenLedger> Harness<L> {
        async fn register(&self, username: &str, email: &str, password: &str) -> User {
            self.repository
                .create(new_user(username, email, self.hasher.hash(password).unwrap()))
                .await
                .unwrap()
        }

        async fn reset_token_for(&self, email: &str) -> String {
            self.service.forgot_password(email).await.unwrap();
            self.mailer.wait_for_token(email).await
        }
    }

    fn reset_command(token: &str, new_password: &str, confirm: &str) -> ResetPasswordCommand {
        ResetPasswordCommand {
            token: token.to_string(),
            new_password: new_password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_by_username_and_email() {
        let h = harness();
        let user = h.register("tricepa", "tricepa@fit.com", "monpasse123").await;

        for login in ["tricepa", "tricepa@fit.com"] {
            let token = h.service.login(login, "monpasse123").await.unwrap();
            let current = h.service.current_user(&token.token).await.unwrap();
            assert_eq!(current.id, user.id);
        }
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;

        let err = h.service.login("tricepa", "wrongpass1").await.unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_current_user_after_deletion() {
        let h = harness();
        let user = h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.service.login("tricepa", "monpasse123").await.unwrap();

        h.repository.delete(&user.id).await.unwrap();

        let err = h.service.current_user(&token.token).await.unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::SubjectNotFound));
    }

    #[tokio::test]
    async fn test_current_user_expired_session() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.service.login("tricepa", "monpasse123").await.unwrap();

        h.clock.advance(Duration::minutes(31));

        let err = h.service.current_user(&token.token).await.unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::TokenExpired));
    }

    #[tokio::test]
    async fn test_forgot_password_identical_for_unknown_email() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;

        let known = h.service.forgot_password("tricepa@fit.com").await.unwrap();
        let unknown = h.service.forgot_password("ghost@fit.com").await.unwrap();

        assert_eq!(known, unknown);
        h.mailer.wait_for_token("tricepa@fit.com").await;
        assert_eq!(h.mailer.count(), 1);
    }

    #[tokio::test]
    async fn test_forgot_password_does_not_wait_for_delivery() {
        let settings = AuthSettings::with_defaults(SECRET).unwrap();
        let repository = Arc::new(InMemoryUserRepository::new());
        repository
            .create(new_user(
                "tricepa",
                "tricepa@fit.com",
                fast_hasher().hash("monpasse123").unwrap(),
            ))
            .await
            .unwrap();
        let service = AccountService::new(
            &settings,
            repository,
            Arc::new(SlowMailer),
            Arc::new(InMemoryResetLedger::new()),
        );

        let started = Instant::now();
        service.forgot_password("ghost@fit.com").await.unwrap();
        let miss = started.elapsed();

        let started = Instant::now();
        service.forgot_password("tricepa@fit.com").await.unwrap();
        let hit = started.elapsed();

        assert!(miss < std::time::Duration::from_millis(100));
        assert!(hit < std::time::Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;

        h.service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap();

        assert!(h.service.login("tricepa", "nouveaupass1").await.is_ok());
        let old = h.service.login("tricepa", "monpasse123").await.unwrap_err();
        assert_eq!(old.failure(), Some(AuthFailure::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;

        h.service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap();

        let replay = h
            .service
            .reset_password(reset_command(&token, "attacker123", "attacker123"))
            .await;
        assert!(matches!(
            replay.unwrap_err(),
            AccountError::ResetTokenAlreadyUsed
        ));
        assert!(h.service.login("tricepa", "nouveaupass1").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_redeem_of_one_token() {
        let h = harness_with(YieldingLedger::default());
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;

        let (first, second) = tokio::join!(
            h.service
                .reset_password(reset_command(&token, "victimpass1", "victimpass1")),
            h.service
                .reset_password(reset_command(&token, "attacker123", "attacker123")),
        );

        let winner = match (&first, &second) {
            (Ok(()), Err(AccountError::ResetTokenAlreadyUsed)) => "victimpass1",
            (Err(AccountError::ResetTokenAlreadyUsed), Ok(())) => "attacker123",
            other => panic!("expected exactly one redemption, got {other:?}"),
        };
        let loser = if winner == "victimpass1" {
            "attacker123"
        } else {
            "victimpass1"
        };

        assert!(h.service.login("tricepa", winner).await.is_ok());
        assert!(h.service.login("tricepa", loser).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_password_mismatch_keeps_token_usable() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;

        let err = h
            .service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass2"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::PasswordMismatch));
        assert!(h.service.login("tricepa", "monpasse123").await.is_ok());

        h.service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_policy_checked_after_token() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;

        let forged = h
            .service
            .reset_password(reset_command("garbage", "short", "short"))
            .await
            .unwrap_err();
        assert_eq!(forged.failure(), Some(AuthFailure::TokenMalformed));

        let token = h.reset_token_for("tricepa@fit.com").await;
        let weak = h
            .service
            .reset_password(reset_command(&token, "short", "short"))
            .await
            .unwrap_err();
        assert!(matches!(weak, AccountError::InvalidPassword(_)));

        h.service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
            .await
            .expect("a rejected policy check does not consume the token");
    }

    #[tokio::test]
    async fn test_reset_password_expired_token() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;

        h.clock.advance(Duration::minutes(16));

        let err = h
            .service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::TokenExpired));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_access_token() {
        let h = harness();
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let access = h.service.login("tricepa", "monpasse123").await.unwrap();

        let err = h
            .service
            .reset_password(reset_command(&access.token, "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::TokenWrongPurpose));
    }

    #[tokio::test]
    async fn test_reset_password_garbage_token() {
        let h = harness();
        let err = h
            .service
            .reset_password(reset_command("garbage", "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::TokenMalformed));
    }

    #[tokio::test]
    async fn test_reset_password_ledger_failure_persists_nothing() {
        let mut ledger = MockTestLedger::new();
        ledger
            .expect_try_consume()
            .times(2)
            .returning(|_, _| Err(AccountError::Ledger("connection reset".to_string())));

        let h = harness_with(ledger);
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;

        for _ in 0..2 {
            let result = h
                .service
                .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
                .await;
            assert!(matches!(result.unwrap_err(), AccountError::Ledger(_)));
        }
        assert!(h.service.login("tricepa", "monpasse123").await.is_ok());
        assert!(h.service.login("tricepa", "nouveaupass1").await.is_err());
    }

    #[tokio::test]
    async fn test_reset_password_not_claimed_on_rejected_token() {
        let mut ledger = MockTestLedger::new();
        ledger.expect_try_consume().times(0);

        let h = harness_with(ledger);
        h.register("tricepa", "tricepa@fit.com", "monpasse123").await;
        let token = h.reset_token_for("tricepa@fit.com").await;
        h.clock.advance(Duration::minutes(16));

        let err = h
            .service
            .reset_password(reset_command(&token, "nouveaupass1", "nouveaupass1"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Some(AuthFailure::TokenExpired));
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = harness();
        let user = h.register("tricepa", "tricepa@fit.com", "monpasse123").await;

        let wrong = h
            .service
            .change_password(
                &user.id,
                ChangePasswordCommand {
                    current_password: "notmypass1".to_string(),
                    new_password: Password::new("nouveaupass1".to_string()).unwrap(),
                    confirm_password: "nouveaupass1".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(wrong.failure(), Some(AuthFailure::InvalidCredentials));

        h.service
            .change_password(
                &user.id,
                ChangePasswordCommand {
                    current_password: "monpasse123".to_string(),
                    new_password: Password::new("nouveaupass1".to_string()).unwrap(),
                    confirm_password: "nouveaupass1".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(h.service.login("tricepa", "nouveaupass1").await.is_ok());
    }
}
