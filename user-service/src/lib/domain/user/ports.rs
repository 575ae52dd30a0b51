use std::time::Duration;

use async_trait::async_trait;
use auth::TokenPair;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::SignInCommand;
use crate::domain::user::models::SignUpCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::RevocationError;
use crate::user::errors::UserError;
use crate::user::models::EmailAddress;

/// Port for account and token lifecycle operations.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated command containing name, phone number, email and password
    ///
    /// # Returns
    /// Identifier of the created account
    ///
    /// # Errors
    /// * `AlreadyExists` - An active account uses this phone number or email
    /// * `Credential` - Password digest failed
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: SignUpCommand) -> Result<UserId, UserError>;

    /// Check a phone number and password and issue a `user` token pair.
    ///
    /// # Errors
    /// * `DoesNotExist` - No active account with this phone number
    /// * `IncorrectPassword` - Password digest does not match
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, command: SignInCommand) -> Result<TokenPair, UserError>;

    /// Exchange a refresh token for a brand-new `user` token pair.
    ///
    /// # Errors
    /// * `Token` - Refresh token failed verification
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, UserError>;

    /// Revoke an access token for the rest of its lifetime.
    ///
    /// # Arguments
    /// * `user_id` - Subject of the token, for logging
    /// * `access_token` - Token to revoke
    /// * `ttl` - Remaining lifetime of the token
    ///
    /// # Errors
    /// * `Revocation` - Revocation store write failed
    async fn logout(
        &self,
        user_id: &UserId,
        access_token: &str,
        ttl: Duration,
    ) -> Result<(), UserError>;

    /// Returns true iff the token has been revoked.
    async fn check_token(&self, token: &str) -> bool;

    /// Issue a token pair for a subject and role tag without credentials.
    ///
    /// # Errors
    /// * `Token(UnknownRole)` - Role tag is neither `user` nor `driver`
    async fn issue_tokens(&self, subject_id: u64, role: &str) -> Result<TokenPair, UserError>;
}

/// Port for profile read, update and deletion.
#[async_trait]
pub trait ProfileServicePort: Send + Sync + 'static {
    /// Retrieve an active profile.
    ///
    /// # Errors
    /// * `DoesNotExist` - No active account with this id
    /// * `DatabaseError` - Database operation failed
    async fn get_profile(&self, id: &UserId) -> Result<User, UserError>;

    /// Update the provided profile fields.
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `DoesNotExist` - No active account with this id
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError>;

    /// Soft-delete an account.
    ///
    /// # Errors
    /// * `DoesNotExist` - No active account with this id
    /// * `DatabaseError` - Database operation failed
    async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
///
/// Every lookup only sees records with status `created`.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Arguments
    /// * `user` - Fields of the new record
    ///
    /// # Returns
    /// Created user entity with its assigned id
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Check whether an active record uses the phone number or the email.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn exists_active(
        &self,
        phone_number: &PhoneNumber,
        email: &EmailAddress,
    ) -> Result<bool, UserError>;

    /// Retrieve active user by phone number.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_active_by_phone_number(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<User>, UserError>;

    /// Retrieve active user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_active_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Overwrite the provided fields of an active record.
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `DoesNotExist` - No active record with this id
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, id: &UserId, changes: UpdateProfileCommand) -> Result<User, UserError>;

    /// Mark an active record as deleted.
    ///
    /// # Errors
    /// * `DoesNotExist` - No active record with this id
    /// * `DatabaseError` - Database operation failed
    async fn soft_delete(&self, id: &UserId) -> Result<(), UserError>;
}

/// Record of access tokens revoked before their natural expiry.
#[async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Mark a token revoked. The entry expires by itself after `ttl`.
    ///
    /// # Errors
    /// * `Unavailable` - Store rejected the write or is unreachable
    /// * `Timeout` - Store did not answer in time
    async fn record(&self, token: &str, ttl: Duration) -> Result<(), RevocationError>;

    /// Returns true iff an unexpired entry exists for the token.
    ///
    /// Backend failures read as "not revoked".
    async fn is_revoked(&self, token: &str) -> bool;
}
