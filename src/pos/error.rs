//! Error type shared by every POS client implementation.

use thiserror::Error;

/// Result type for POS calls.
pub type PosResult<T> = Result<T, PosError>;

/// How many characters of an upstream body to keep in error text.
const BODY_EXCERPT_LEN: usize = 200;

/// Failure of a single logical POS fetch.
///
/// Callers treat transport and status failures as transient (serve stale,
/// degrade to empty) and decode/config failures as bugs worth surfacing in
/// logs at a higher level.
#[derive(Debug, Error)]
pub enum PosError {
    /// Request never produced a response: connect failure, timeout, TLS.
    #[error("transport error calling {endpoint}: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },

    /// Upstream answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Response body arrived but is not the shape the endpoint promises.
    #[error("could not decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    /// Client-side setup problem, reported before any request is made.
    #[error("POS client configuration error: {0}")]
    Config(String),
}

impl PosError {
    /// Create a transport error for an endpoint.
    pub fn transport(endpoint: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            endpoint,
            message: err.to_string(),
        }
    }

    /// Create a status error, keeping only an excerpt of the body.
    pub fn status(endpoint: &'static str, status: u16, body: &str) -> Self {
        Self::Status {
            endpoint,
            status,
            body: excerpt(body),
        }
    }

    /// Create a decode error for an endpoint.
    pub fn decode(endpoint: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint,
            message: err.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

/// Trim an upstream body down to something loggable.
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LEN {
        trimmed.to_string()
    } else {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < BODY_EXCERPT_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &trimmed[..cut])
    }
}
