use thiserror::Error;

/// Error type for token issuance and verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unknown type: {0}")]
    UnknownRole(String),

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    EncodingFailed(String),
}
