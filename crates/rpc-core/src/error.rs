use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    endpoint::DescriptorError, payload::JsonObject, payload::PayloadError,
    transport::TransportError,
};

/// `errcode` returned by homeservers when a client is being rate-limited.
pub const LIMIT_EXCEEDED_ERRCODE: &str = "M_LIMIT_EXCEEDED";

/// Broad error category used for caller-side handling and retry decisions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input, malformed descriptor, or other caller-side mistake.
    Config,
    /// Authentication/authorization failure.
    Auth,
    /// Transient network or transport failure.
    Network,
    /// Rate-limited by homeserver.
    RateLimited,
    /// Serialization/deserialization failure.
    Serialization,
    /// Internal bug, cancellation, or unclassified status.
    Internal,
}

/// Structured failure returned by a homeserver for a non-success response.
///
/// Values are only produced by [`crate::error_mapper::map_error_response`]
/// and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} (HTTP {status}): {message}")]
pub struct ProtocolError {
    status: u16,
    code: String,
    message: String,
    retry_after: Option<Duration>,
    raw: Vec<u8>,
}

impl ProtocolError {
    pub(crate) fn new(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        raw: Vec<u8>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            retry_after: None,
            raw,
        }
    }

    pub(crate) fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// HTTP status code of the failed response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Protocol error code, for example `M_FORBIDDEN`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Server-provided retry hint, when present.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Original response body bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded error object including members beyond `errcode`/`error`.
    ///
    /// Returns `None` when the body was not a JSON object.
    pub fn details(&self) -> Option<JsonObject> {
        serde_json::from_slice(&self.raw).ok()
    }

    /// Category derived from the error code and HTTP status.
    pub fn category(&self) -> ErrorCategory {
        if self.code == LIMIT_EXCEEDED_ERRCODE {
            return ErrorCategory::RateLimited;
        }
        classify_http_status(self.status)
    }
}

/// Failure of a single dispatch call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The endpoint descriptor could not be built or resolved to a URL.
    #[error("invalid endpoint descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
    /// The request body could not be serialized.
    #[error("failed to encode request body")]
    Encoding(#[source] PayloadError),
    /// The endpoint requires a bearer token but none was configured.
    #[error("endpoint '{endpoint}' requires an access token")]
    MissingAccessToken {
        /// Endpoint name.
        endpoint: &'static str,
    },
    /// The transport failed; the error is passed through unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The homeserver answered with a non-success status.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// A success response body did not match the expected shape.
    #[error("failed to decode response body")]
    Decoding(#[source] PayloadError),
    /// The call was cancelled before the transport completed.
    #[error("request was cancelled")]
    Cancelled,
}

impl DispatchError {
    /// Broad category for caller-side handling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Descriptor(_) => ErrorCategory::Config,
            Self::Encoding(_) | Self::Decoding(_) => ErrorCategory::Serialization,
            Self::MissingAccessToken { .. } => ErrorCategory::Auth,
            Self::Transport(_) => ErrorCategory::Network,
            Self::Protocol(err) => err.category(),
            Self::Cancelled => ErrorCategory::Internal,
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::RateLimited
        )
    }

    /// The protocol error, if the homeserver rejected the request.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

/// Map HTTP status codes to error categories.
pub fn classify_http_status(status: u16) -> ErrorCategory {
    match status {
        401 | 403 => ErrorCategory::Auth,
        408 | 429 => ErrorCategory::RateLimited,
        400..=499 => ErrorCategory::Config,
        500..=599 => ErrorCategory::Network,
        _ => ErrorCategory::Internal,
    }
}
