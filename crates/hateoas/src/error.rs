//! Error types for the hypermedia client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the service on failing requests.
///
/// Only some endpoints return this shape; `ErrorCode` must be present for a
/// body to be treated as structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine readable error code.
    #[serde(rename = "ErrorCode")]
    pub code: String,
    /// Human readable summary.
    #[serde(rename = "ErrorMessage", default)]
    pub message: String,
    /// Additional detail, often empty.
    #[serde(rename = "ErrorDetails", default)]
    pub details: String,
}

/// Errors that can occur while navigating or calling a hypermedia API.
///
/// Every failure is reported to the caller as soon as it happens; nothing is
/// retried inside the client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing or invalid entry point, detected before any request is sent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required link relation is absent from the current resource.
    #[error("Link not found: {rel}")]
    LinkNotFound {
        /// The relation that could not be resolved.
        rel: String,
    },

    /// The service answered with a failing status and no structured error body.
    #[error("HTTP status error: {status} from {url}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: u16,
        /// URL of the failing request.
        url: String,
    },

    /// The service answered with a failing status and a structured error body.
    #[error("Service error {status}: {code}: {message}")]
    Service {
        /// Numeric HTTP status code.
        status: u16,
        /// `ErrorCode` from the body.
        code: String,
        /// `ErrorMessage` from the body.
        message: String,
        /// `ErrorDetails` from the body.
        details: String,
    },

    /// A successful response whose body is not the expected JSON shape.
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request body could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Network or HTTP transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure raised by a middleware layer of the injected transport.
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// A URL (start URL or link href) could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// A header name or value is not valid on the wire.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl Error {
    pub(crate) fn link_not_found(rel: impl Into<String>) -> Self {
        Self::LinkNotFound { rel: rel.into() }
    }

    /// Check if this error reports a missing link relation.
    pub const fn is_link_not_found(&self) -> bool {
        matches!(self, Self::LinkNotFound { .. })
    }

    /// The HTTP status carried by this error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } | Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the service rejected the request as unauthenticated (HTTP 401).
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }
}
