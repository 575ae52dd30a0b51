use thiserror::Error;

/// Error type for credential digest operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Salt too short for {algorithm}: minimum {min} bytes, got {actual}")]
    SaltTooShort {
        algorithm: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("Unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Credential hashing failed: {0}")]
    HashingFailed(String),
}
