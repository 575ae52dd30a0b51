use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::TokenError;

/// Role tag carried by every identity token.
///
/// Limits which issuing and verifying paths accept a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "driver" => Ok(Role::Driver),
            other => Err(TokenError::UnknownRole(other.to_string())),
        }
    }
}

/// Claim set as it is laid out inside the signed token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct WireClaims {
    pub user_id: u64,
    #[serde(rename = "type")]
    pub role: String,
    pub exp: i64,
}

/// Decoded claims of a token whose signature has been checked.
///
/// Expiry has not been checked; see [`TokenCodec::verify`](super::TokenCodec::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: u64,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Check if token is expired at the given instant.
    ///
    /// A token expiring in the same second as `now` is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.timestamp() < now.timestamp()
    }
}

impl TryFrom<WireClaims> for Claims {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        let role = wire.role.parse()?;
        let expires_at = DateTime::from_timestamp(wire.exp, 0)
            .ok_or_else(|| TokenError::Malformed(format!("exp out of range: {}", wire.exp)))?;

        Ok(Self {
            subject_id: wire.user_id,
            role,
            expires_at,
        })
    }
}

/// Token that passed signature, expiry and role checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject_id: u64,
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh tokens issued together for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
