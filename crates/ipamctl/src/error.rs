//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ipam_config::ConfigError;
use ipam_core::CoreError;

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the appliance")]
    #[diagnostic(
        code(ipamctl::connection_failed),
        help(
            "Check that the appliance is reachable and the host/port are right.\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not send the request: {message}")]
    #[diagnostic(
        code(ipamctl::request_failed),
        help("Check the TLS settings (ca_cert, --insecure) and the appliance URL.")
    )]
    RequestFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(ipamctl::timeout),
        help("Increase timeout with --timeout or check appliance responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ipamctl::auth_failed),
        help(
            "Verify the username and password.\n\
             Run: ipamctl config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(ipamctl::no_credentials),
        help(
            "Configure credentials with: ipamctl config init\n\
             Or set IPAM_USERNAME and IPAM_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(ipamctl::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(ipamctl::conflict),
        help("The object probably exists already; read it with the matching `get` command.")
    )]
    Conflict { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(code(ipamctl::permission))]
    PermissionDenied { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(ipamctl::api_error))]
    ApiError { code: String, message: String },

    #[error("Operation '{operation}' is not supported by the appliance API")]
    #[diagnostic(code(ipamctl::unsupported))]
    Unsupported { operation: String },

    // ── Workflows ────────────────────────────────────────────────────
    #[error("{operation} failed: {reason}")]
    #[diagnostic(
        code(ipamctl::workflow_failed),
        help("{rollback}. Inspect the objects involved before retrying.")
    )]
    WorkflowFailed {
        operation: String,
        reason: String,
        rollback: String,
    },

    #[error("{operation} cancelled")]
    #[diagnostic(code(ipamctl::cancelled))]
    Cancelled { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ipamctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ipamctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ipamctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(ipamctl::no_config),
        help(
            "Create one with: ipamctl config init\n\
             Expected at: {path}\n\
             Or pass --host and --username."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ipamctl::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(ipamctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(ipamctl::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(ipamctl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::RequestFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::PermissionDenied { .. } | Self::Unsupported { .. } => exit_code::PERMISSION,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile(name) => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource_type: resource,
                identifier,
            },

            CoreError::Authentication { message } => Self::AuthFailed {
                profile: "<profile>".into(),
                message,
            },

            CoreError::Transport(e) if e.is_timeout() => Self::Timeout,
            CoreError::Transport(e) if e.is_transient() => {
                Self::ConnectionFailed { source: e.into() }
            }
            CoreError::Transport(e) => Self::RequestFailed {
                message: e.to_string(),
            },

            CoreError::Http {
                status: 409, body, ..
            } => Self::Conflict { message: body },
            CoreError::Http {
                status: 403, body, ..
            } => Self::PermissionDenied { message: body },
            CoreError::Http {
                method,
                path,
                status,
                code,
                body,
            } => Self::ApiError {
                code: format!("HTTP {status} {code}"),
                message: format!("{method} {path}: {body}"),
            },

            CoreError::Decode { message, .. } => Self::ApiError {
                code: "decode".into(),
                message,
            },

            CoreError::Validation { field, reason } => Self::Validation { field, reason },

            CoreError::Unsupported { operation } => Self::Unsupported { operation },

            CoreError::Cancelled { operation } => Self::Cancelled { operation },

            // Keep the classification of the inner failure, drop the context
            // only when it adds nothing the inner error lacks.
            CoreError::Operation {
                operation,
                resource,
                source,
            } => match Self::from(*source) {
                Self::ApiError { code, message } => Self::ApiError {
                    code,
                    message: format!("{operation} {resource}: {message}"),
                },
                other => other,
            },

            CoreError::Workflow {
                operation,
                source,
                rollback,
            } => Self::WorkflowFailed {
                operation,
                reason: source.to_string(),
                rollback: rollback.to_string(),
            },

            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
        }
    }
}
