use auth::AuthenticationError;
use auth::CredentialError;
use auth::TokenError;
use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid user id: {0}")]
    InvalidFormat(String),
}

/// Error for required text fields (name, phone number)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} too long: maximum {max} characters, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for revocation store operations
#[derive(Debug, Clone, Error)]
pub enum RevocationError {
    #[error("Revocation store unavailable: {0}")]
    Unavailable(String),

    #[error("Revocation store timeout")]
    Timeout,
}

/// Top-level error for all user and session operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid field: {0}")]
    InvalidField(#[from] FieldError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    // Domain-level errors
    #[error("user already exists")]
    AlreadyExists,

    #[error("user does not exist")]
    DoesNotExist,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("{0}")]
    Token(#[from] TokenError),

    // Infrastructure errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Revocation error: {0}")]
    Revocation(#[from] RevocationError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<AuthenticationError> for UserError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::IncorrectPassword => UserError::IncorrectPassword,
            AuthenticationError::Credential(e) => UserError::Credential(e),
            AuthenticationError::Token(e) => UserError::Token(e),
        }
    }
}
