use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::errors::AccountError;
use crate::account::ports::ResetTokenLedger;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user storage, used by tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(users: &HashMap<UserId, User>, candidate: &User) -> Result<(), UserError> {
        for existing in users.values().filter(|u| u.id != candidate.id) {
            if existing.username == candidate.username {
                return Err(UserError::UsernameAlreadyExists(
                    candidate.username.as_str().to_string(),
                ));
            }
            if existing.email == candidate.email {
                return Err(UserError::EmailAlreadyExists(
                    candidate.email.as_str().to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        Self::check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email.as_str() == email).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username.as_str() == login || u.email.as_str() == login)
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id.to_string()));
        }
        Self::check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or(UserError::NotFound(id.to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        self.users
            .write()
            .await
            .remove(id)
            .ok_or(UserError::NotFound(id.to_string()))?;
        Ok(())
    }
}

/// Process-local record of consumed reset tokens.
#[derive(Default)]
pub struct InMemoryResetLedger {
    consumed: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryResetLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResetTokenLedger for InMemoryResetLedger {
    async fn try_consume(
        &self,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AccountError> {
        let mut consumed = self.consumed.write().await;
        // Entries past their token's expiry can no longer be replayed anyway.
        let now = Utc::now();
        consumed.retain(|_, expiry| *expiry >= now);
        Ok(consumed
            .insert(fingerprint.to_string(), expires_at)
            .is_none())
    }
}
