use thiserror::Error;

/// Top-level error type for the `ipam-api` crate.
///
/// Covers every failure mode of the wire layer: login, transport,
/// non-accepted HTTP statuses, "not found" replies, and body decoding.
/// `ipam-core` maps these into the workflow-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, unexpected token shape, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The appliance rejected the session token (HTTP 401 after login).
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Remote API ──────────────────────────────────────────────────
    /// The status code is not accepted for the request method.
    #[error("{method} {path} failed (HTTP {status} {code}): {body}")]
    Http {
        method: String,
        path: String,
        status: u16,
        code: String,
        body: String,
    },

    /// The appliance reported the addressed object as absent, or the
    /// object decoded with `id == 0`.
    #[error("Object not found at {path}")]
    NotFound { path: String, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// An entity could not be serialized into a request body.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    // ── Caller input ────────────────────────────────────────────────
    /// Input rejected before anything was sent (bad CIDR, bad flag value...).
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Operation not supported by the remote API.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    ///
    /// Besides the explicit [`NotFound`](Self::NotFound) variant, transport
    /// errors that carry a 404 status qualify.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the request ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variant_is_classified() {
        let err = Error::NotFound {
            path: "/configurations/x".into(),
            body: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Http {
            method: "GET".into(),
            path: "/x".into(),
            status: 503,
            code: "Service Unavailable".into(),
            body: String::new(),
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }
}
