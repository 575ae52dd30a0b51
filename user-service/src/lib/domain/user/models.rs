use std::fmt;
use std::str::FromStr;

use crate::user::errors::EmailError;
use crate::user::errors::FieldError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account. `password_digest` is the stored output of
/// the credential hasher, never the plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub phone_number: PhoneNumber,
    pub email: EmailAddress,
    pub rating: f64,
    pub status: UserStatus,
    pub password_digest: Vec<u8>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

impl UserId {
    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - Decimal identifier, as found in request paths
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not an unsigned integer
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        s.parse::<u64>()
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(format!("{s}: {e}")))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Record lifecycle marker. Only `Created` records are visible to lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Created,
    Deleted,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Created => "created",
            UserStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(UserStatus::Created),
            "deleted" => Ok(UserStatus::Deleted),
            other => Err(format!("unknown user status: {other}")),
        }
    }
}

fn non_empty(field: &'static str, max: usize, value: String) -> Result<String, FieldError> {
    let length = value.chars().count();
    if value.trim().is_empty() {
        Err(FieldError::Empty { field })
    } else if length > max {
        Err(FieldError::TooLong {
            field,
            max,
            actual: length,
        })
    } else {
        Ok(value)
    }
}

/// Display name value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    const MAX_LENGTH: usize = 128;

    /// Create a new display name.
    ///
    /// # Errors
    /// * `Empty` - Name is empty or whitespace
    /// * `TooLong` - Name longer than 128 characters
    pub fn new(name: String) -> Result<Self, FieldError> {
        non_empty("name", Self::MAX_LENGTH, name).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number value type
///
/// Used as the sign-in login. Stored as given; no normalisation is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MAX_LENGTH: usize = 32;

    /// Create a new phone number.
    ///
    /// # Errors
    /// * `Empty` - Number is empty or whitespace
    /// * `TooLong` - Number longer than 32 characters
    pub fn new(phone_number: String) -> Result<Self, FieldError> {
        non_empty("phone_number", Self::MAX_LENGTH, phone_number).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    ///
    /// # Returns
    /// Email string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct SignUpCommand {
    pub name: UserName,
    pub phone_number: PhoneNumber,
    pub email: EmailAddress,
    pub password: String,
}

impl SignUpCommand {
    /// Construct a new sign-up command.
    ///
    /// # Arguments
    /// * `name` - Validated display name
    /// * `phone_number` - Validated phone number
    /// * `email` - Validated email address
    /// * `password` - Plain text password (digested by the service)
    pub fn new(
        name: UserName,
        phone_number: PhoneNumber,
        email: EmailAddress,
        password: String,
    ) -> Self {
        Self {
            name,
            phone_number,
            email,
            password,
        }
    }
}

/// Command to authenticate by phone number and password.
#[derive(Debug)]
pub struct SignInCommand {
    pub phone_number: PhoneNumber,
    pub password: String,
}

/// Row to insert for a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: UserName,
    pub phone_number: PhoneNumber,
    pub email: EmailAddress,
    pub password_digest: Vec<u8>,
}

/// Command to update an existing profile with optional validated fields.
///
/// Only provided fields will be updated.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateProfileCommand {
    pub name: Option<UserName>,
    pub phone_number: Option<PhoneNumber>,
    pub email: Option<EmailAddress>,
}

impl UpdateProfileCommand {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.email.is_none()
    }
}
