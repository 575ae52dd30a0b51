use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use auth::Role;
use auth::TokenPair;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::SignInCommand;
use crate::domain::user::models::SignUpCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::ProfileServicePort;
use crate::user::ports::RevocationStore;
use crate::user::ports::SessionServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for account and token lifecycle.
///
/// Concrete implementation of SessionServicePort with dependency injection.
pub struct SessionService<UR, RS>
where
    UR: UserRepository,
    RS: RevocationStore,
{
    repository: Arc<UR>,
    revocations: Arc<RS>,
    authenticator: Arc<Authenticator>,
}

impl<UR, RS> SessionService<UR, RS>
where
    UR: UserRepository,
    RS: RevocationStore,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `revocations` - Revoked token store implementation
    /// * `authenticator` - Credential digests and token codec
    ///
    /// # Returns
    /// Configured session service instance
    pub fn new(
        repository: Arc<UR>,
        revocations: Arc<RS>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            repository,
            revocations,
            authenticator,
        }
    }
}

#[async_trait]
impl<UR, RS> SessionServicePort for SessionService<UR, RS>
where
    UR: UserRepository,
    RS: RevocationStore,
{
    async fn register(&self, command: SignUpCommand) -> Result<UserId, UserError> {
        // Two concurrent sign-ups can both pass this check; there is no unique index to stop them.
        if self
            .repository
            .exists_active(&command.phone_number, &command.email)
            .await?
        {
            return Err(UserError::AlreadyExists);
        }

        let password_digest = self.authenticator.digest_password(&command.password)?;

        let user = self
            .repository
            .create(NewUser {
                name: command.name,
                phone_number: command.phone_number,
                email: command.email,
                password_digest,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user.id)
    }

    async fn authenticate(&self, command: SignInCommand) -> Result<TokenPair, UserError> {
        let user = self
            .repository
            .find_active_by_phone_number(&command.phone_number)
            .await?
            .ok_or(UserError::DoesNotExist)?;

        let pair = self.authenticator.authenticate(
            &command.password,
            &user.password_digest,
            user.id.value(),
        )?;

        tracing::info!(user_id = %user.id, "User signed in");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, UserError> {
        let verified = self.authenticator.verify_token(refresh_token)?;

        Ok(self
            .authenticator
            .issue_tokens(verified.subject_id, Role::User)?)
    }

    async fn logout(
        &self,
        user_id: &UserId,
        access_token: &str,
        ttl: Duration,
    ) -> Result<(), UserError> {
        self.revocations.record(access_token, ttl).await?;

        tracing::info!(user_id = %user_id, ttl_secs = ttl.as_secs(), "Access token revoked");

        Ok(())
    }

    async fn check_token(&self, token: &str) -> bool {
        self.revocations.is_revoked(token).await
    }

    async fn issue_tokens(&self, subject_id: u64, role: &str) -> Result<TokenPair, UserError> {
        let role: Role = role.parse()?;

        Ok(self.authenticator.issue_tokens(subject_id, role)?)
    }
}

/// Domain service implementation for profile operations.
pub struct ProfileService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
}

impl<UR> ProfileService<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<UR> ProfileServicePort for ProfileService<UR>
where
    UR: UserRepository,
{
    async fn get_profile(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_active_by_id(id)
            .await?
            .ok_or(UserError::DoesNotExist)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError> {
        if command.is_empty() {
            return self.get_profile(id).await;
        }

        self.repository.update(id, command).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.soft_delete(id).await?;

        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}
