use std::sync::Arc;

use async_trait::async_trait;
use auth::Credential;
use auth::CredentialStore;
use auth::StoreError;

use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// Exposes the user repository to the authentication gateway.
///
/// Inactive accounts are invisible here: they cannot log in, resolve a
/// session, or receive reset tokens.
pub struct RepositoryCredentialStore<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
}

impl<UR> RepositoryCredentialStore<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }

    async fn active_user(&self, subject_id: &str) -> Result<Option<User>, StoreError> {
        let Ok(id) = UserId::from_string(subject_id) else {
            return Ok(None);
        };
        let user = self.repository.find_by_id(&id).await?;
        Ok(user.filter(|u| u.is_active))
    }
}

fn to_credential(user: User) -> Credential {
    Credential {
        subject_id: user.id.to_string(),
        email: user.email.as_str().to_string(),
        password_hash: user.password_hash,
    }
}

#[async_trait]
impl<UR> CredentialStore for RepositoryCredentialStore<UR>
where
    UR: UserRepository,
{
    type Subject = User;

    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, StoreError> {
        let user = self.repository.find_by_login(login).await?;
        Ok(user.filter(|u| u.is_active).map(to_credential))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let user = self.repository.find_by_email(email).await?;
        Ok(user.filter(|u| u.is_active).map(to_credential))
    }

    async fn find_by_subject_id(
        &self,
        subject_id: &str,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self.active_user(subject_id).await?.map(to_credential))
    }

    async fn load_subject(&self, subject_id: &str) -> Result<Option<User>, StoreError> {
        self.active_user(subject_id).await
    }

    async fn update_password_hash(
        &self,
        subject_id: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let id = UserId::from_string(subject_id).map_err(StoreError::new)?;
        self.repository
            .update_password_hash(&id, password_hash)
            .await?;
        Ok(())
    }
}
