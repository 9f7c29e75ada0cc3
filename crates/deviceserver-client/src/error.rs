//! Error types for the device server client.

use thiserror::Error;

/// Failures while signing or verifying a compact token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignatureError {
    /// The token is not three base64url segments with a JSON header.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The header names an algorithm other than `HS256`.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The MAC does not match the header and payload.
    #[error("Signature verification failed")]
    InvalidSignature,

    /// The signing key was rejected by the MAC implementation.
    #[error("Invalid signing key")]
    InvalidKey,

    /// The claim could not be serialized to JSON.
    #[error("Claim serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by [`RestClient`](crate::RestClient) operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Navigation, transport or service failure.
    #[error(transparent)]
    Hateoas(#[from] hateoas::Error),

    /// Token signing failure.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl Error {
    /// Check if the service rejected the request as unauthenticated (HTTP 401).
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Hateoas(e) if e.is_unauthorized())
    }

    /// Check if a required link relation was missing.
    ///
    /// An unauthenticated session typically sees this instead of a 401,
    /// since the service hides the relations it would refuse anyway.
    pub const fn is_link_not_found(&self) -> bool {
        matches!(self, Self::Hateoas(e) if e.is_link_not_found())
    }
}
