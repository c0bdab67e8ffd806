// ── Core error types ──
//
// Workflow-facing errors. Wire details (URL paths, reqwest errors) are
// folded into a small taxonomy; the `From<ipam_api::Error>` impl does the
// translation. Multi-step operations report a `Workflow` error that also
// carries what happened to the rollback.

use std::fmt;

use thiserror::Error;

/// Outcome of the compensating steps run after a workflow failed mid-way.
#[derive(Debug)]
pub enum RollbackOutcome {
    /// Every recorded effect was undone.
    Applied,
    /// Undoing failed; the appliance may be partially changed.
    Failed(Box<CoreError>),
    /// Nothing had been applied, so nothing was undone.
    NotAttempted,
}

impl RollbackOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("rollback applied"),
            Self::Failed(e) => write!(f, "rollback failed: {e}"),
            Self::NotAttempted => f.write_str("rollback not attempted"),
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup ───────────────────────────────────────────────────────
    /// The appliance reported the object absent (or replied with id 0).
    #[error("{resource} not found: {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
    },

    // ── Session / transport ──────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Connection, TLS, or timeout failure, passed through unchanged.
    #[error("Transport error: {0}")]
    Transport(#[source] ipam_api::Error),

    /// Non-accepted HTTP status.
    #[error("{method} {path} failed (HTTP {status} {code}): {body}")]
    Http {
        method: String,
        path: String,
        status: u16,
        code: String,
        body: String,
    },

    #[error("Could not decode reply: {message}")]
    Decode { message: String, body: String },

    // ── Caller input ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    // ── Orchestration ────────────────────────────────────────────────
    #[error("{operation} cancelled")]
    Cancelled { operation: String },

    /// A single call failed; names the operation and the resource key.
    #[error("{operation} {resource}: {source}")]
    Operation {
        operation: &'static str,
        resource: String,
        #[source]
        source: Box<CoreError>,
    },

    /// A multi-step workflow failed after (possibly) changing state.
    #[error("{operation} failed: {source} ({rollback})")]
    Workflow {
        operation: String,
        #[source]
        source: Box<CoreError>,
        rollback: RollbackOutcome,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    /// True for a not-found reply, looking through operation context.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Operation { source, .. } | Self::Workflow { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Rollback outcome, if this is a workflow failure.
    pub fn rollback(&self) -> Option<&RollbackOutcome> {
        match self {
            Self::Workflow { rollback, .. } => Some(rollback),
            _ => None,
        }
    }

    /// Attach the operation and resource key.
    ///
    /// Errors that already identify their subject (not-found, workflow,
    /// cancellation, existing context) pass through unchanged.
    pub fn during(self, operation: &'static str, resource: impl Into<String>) -> Self {
        match self {
            Self::NotFound { .. }
            | Self::Operation { .. }
            | Self::Workflow { .. }
            | Self::Cancelled { .. } => self,
            other => Self::Operation {
                operation,
                resource: resource.into(),
                source: Box::new(other),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ipam_api::Error> for CoreError {
    fn from(err: ipam_api::Error) -> Self {
        use ipam_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::Authentication { message },
            Api::SessionExpired => Self::Authentication {
                message: "session token rejected by the appliance".into(),
            },
            Api::Transport(_) | Api::Tls(_) => Self::Transport(err),
            Api::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Http {
                method,
                path,
                status,
                code,
                body,
            } => Self::Http {
                method,
                path,
                status,
                code,
                body,
            },
            Api::NotFound { path, body: _ } => Self::NotFound {
                resource: "object".into(),
                identifier: path,
            },
            Api::Deserialization { message, body } => Self::Decode { message, body },
            Api::Encode(e) => Self::Decode {
                message: format!("request body: {e}"),
                body: String::new(),
            },
            Api::Validation { field, reason } => Self::Validation { field, reason },
            Api::UnsupportedOperation(op) => Self::Unsupported {
                operation: op.to_owned(),
            },
        }
    }
}
