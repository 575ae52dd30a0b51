//! Authentication utilities library
//!
//! Provides the token and credential primitives of the user service:
//! - Credential digests bound to a process-wide salt (SHA-1 or Argon2id)
//! - HS256 identity tokens carrying a numeric subject and a role tag
//! - Authentication coordination
//!
//! Everything here is pure computation over static settings; storage of
//! users and revoked tokens lives in the services that use it.
//!
//! # Examples
//!
//! ## Credential digests
//! ```
//! use auth::{CredentialHasher, DigestAlgorithm};
//!
//! let hasher = CredentialHasher::new("process-wide-salt", DigestAlgorithm::Sha1).unwrap();
//! let digest = hasher.digest("my_password").unwrap();
//! assert!(hasher.matches("my_password", &digest).unwrap());
//! ```
//!
//! ## Identity tokens
//! ```
//! use auth::{Role, TokenCodec};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!", Duration::minutes(15), Duration::days(30));
//! let pair = codec.issue(42, Role::User).unwrap();
//! let verified = codec.verify(&pair.access_token).unwrap();
//! assert_eq!(verified.subject_id, 42);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, CredentialHasher, DigestAlgorithm, TokenCodec};
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(
//!     CredentialHasher::new("process-wide-salt", DigestAlgorithm::Sha1).unwrap(),
//!     TokenCodec::new(b"secret_key_at_least_32_bytes_long!", Duration::minutes(15), Duration::days(30)),
//! );
//!
//! // Register: digest password
//! let digest = auth.digest_password("password123").unwrap();
//!
//! // Login: check digest and issue tokens
//! let pair = auth.authenticate("password123", &digest, 7).unwrap();
//!
//! // Validate token
//! let verified = auth.verify_token(&pair.access_token).unwrap();
//! assert_eq!(verified.subject_id, 7);
//! ```

pub mod authenticator;
pub mod credential;
pub mod jwt;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use credential::CredentialError;
pub use credential::CredentialHasher;
pub use credential::DigestAlgorithm;
pub use jwt::Claims;
pub use jwt::Role;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use jwt::TokenPair;
pub use jwt::VerifiedToken;
