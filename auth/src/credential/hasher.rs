use std::fmt;
use std::str::FromStr;

use argon2::Argon2;
use serde::Deserialize;
use sha1::Digest;
use sha1::Sha1;

use super::errors::CredentialError;

/// Digest function applied to a secret together with the process-wide salt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// `salt ‖ SHA-1(secret)`. Matches the digests already stored in the user table.
    #[default]
    Sha1,
    /// Argon2id keyed with the process-wide salt.
    Argon2,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Argon2 => "argon2",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "argon2" => Ok(DigestAlgorithm::Argon2),
            other => Err(CredentialError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Deterministic one-way transform of a secret into a storable digest.
///
/// The salt is shared by every account and loaded once at startup, so equal
/// secrets produce equal digests across users. With the default SHA-1 digest
/// this is weak against offline guessing: a stolen table can be attacked with
/// one precomputed dictionary. `DigestAlgorithm::Argon2` slows that down but
/// keeps the single-salt layout; per-user salts would need a schema change.
#[derive(Clone)]
pub struct CredentialHasher {
    salt: Vec<u8>,
    algorithm: DigestAlgorithm,
}

impl CredentialHasher {
    const ARGON2_MIN_SALT: usize = 8;
    const ARGON2_OUTPUT_LEN: usize = 32;

    /// Create a hasher bound to the process-wide salt.
    ///
    /// # Errors
    /// * `SaltTooShort` - Argon2 requires at least 8 bytes of salt
    pub fn new(
        salt: impl Into<Vec<u8>>,
        algorithm: DigestAlgorithm,
    ) -> Result<Self, CredentialError> {
        let salt = salt.into();

        if algorithm == DigestAlgorithm::Argon2 && salt.len() < Self::ARGON2_MIN_SALT {
            return Err(CredentialError::SaltTooShort {
                algorithm: algorithm.as_str(),
                min: Self::ARGON2_MIN_SALT,
                actual: salt.len(),
            });
        }

        Ok(Self { salt, algorithm })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Compute the digest of a plaintext secret.
    ///
    /// # Errors
    /// * `HashingFailed` - The underlying primitive rejected its input
    pub fn digest(&self, secret: &str) -> Result<Vec<u8>, CredentialError> {
        match self.algorithm {
            DigestAlgorithm::Sha1 => {
                let hash = Sha1::digest(secret.as_bytes());
                let mut digest = Vec::with_capacity(self.salt.len() + hash.len());
                digest.extend_from_slice(&self.salt);
                digest.extend_from_slice(&hash);
                Ok(digest)
            }
            DigestAlgorithm::Argon2 => {
                let mut digest = vec![0u8; Self::ARGON2_OUTPUT_LEN];
                Argon2::default()
                    .hash_password_into(secret.as_bytes(), &self.salt, &mut digest)
                    .map_err(|e| CredentialError::HashingFailed(e.to_string()))?;
                Ok(digest)
            }
        }
    }

    /// Recompute the digest of `secret` and compare it byte-for-byte with `stored`.
    pub fn matches(&self, secret: &str, stored: &[u8]) -> Result<bool, CredentialError> {
        Ok(self.digest(secret)? == stored)
    }
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
