use crate::credential::CredentialError;
use crate::credential::CredentialHasher;
use crate::jwt::Role;
use crate::jwt::TokenCodec;
use crate::jwt::TokenError;
use crate::jwt::TokenPair;
use crate::jwt::VerifiedToken;

/// Authentication coordinator combining credential digests and token handling.
///
/// Built once at startup from static settings and shared read-only between
/// request handlers.
pub struct Authenticator {
    hasher: CredentialHasher,
    codec: TokenCodec,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthenticationError {
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `hasher` - Credential hasher bound to the process-wide salt
    /// * `codec` - Token codec bound to the signing secret and TTLs
    pub fn new(hasher: CredentialHasher, codec: TokenCodec) -> Self {
        Self { hasher, codec }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.codec
    }

    /// Digest a plaintext secret for storage.
    ///
    /// # Errors
    /// * `CredentialError` - Hashing operation failed
    pub fn digest_password(&self, password: &str) -> Result<Vec<u8>, CredentialError> {
        self.hasher.digest(password)
    }

    /// Check a plaintext secret against a stored digest and issue a `user` token pair.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to check
    /// * `stored_digest` - Digest persisted at registration
    /// * `subject_id` - Identifier embedded in the issued tokens
    ///
    /// # Errors
    /// * `IncorrectPassword` - Digest does not match
    /// * `Credential` - Digest computation failed
    /// * `Token` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_digest: &[u8],
        subject_id: u64,
    ) -> Result<TokenPair, AuthenticationError> {
        if !self.hasher.matches(password, stored_digest)? {
            return Err(AuthenticationError::IncorrectPassword);
        }

        Ok(self.codec.issue(subject_id, Role::User)?)
    }

    /// Issue a token pair without checking credentials.
    ///
    /// Used by refresh and by trusted internal callers.
    pub fn issue_tokens(&self, subject_id: u64, role: Role) -> Result<TokenPair, TokenError> {
        self.codec.issue(subject_id, role)
    }

    /// Verify a token for this service's protected paths.
    pub fn verify_token(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.codec.verify(token)
    }
}
