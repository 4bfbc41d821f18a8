//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sweetsync_config::ConfigError;
use sweetsync_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the inventory service at {url}")]
    #[diagnostic(
        code(sweetsync::connection_failed),
        help(
            "Check that the service is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sweetsync::auth_failed),
        help(
            "Log in again with: sweetsync login --save\n\
             Or pass a token with --token / SWEETSYNC_TOKEN."
        )
    )]
    AuthFailed { message: String },

    #[error("No password available for '{username}' in profile '{profile}'")]
    #[diagnostic(
        code(sweetsync::no_credentials),
        help(
            "Set SWEETSYNC_PASSWORD, or store a token with: sweetsync config set-token {profile}"
        )
    )]
    NoCredentials { profile: String, username: String },

    // ── Items ────────────────────────────────────────────────────────
    #[error("Item '{identifier}' not found")]
    #[diagnostic(
        code(sweetsync::not_found),
        help("Run: sweetsync items list to see available items")
    )]
    NotFound { identifier: String },

    #[error("The service refused the request ({status}): {message}")]
    #[diagnostic(code(sweetsync::rejected))]
    Rejected { status: u16, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(sweetsync::api_error))]
    ApiError { status: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sweetsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sweetsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: sweetsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No service configured")]
    #[diagnostic(
        code(sweetsync::no_config),
        help(
            "Create a profile with: sweetsync config init\n\
             Or pass --server. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(sweetsync::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(sweetsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(sweetsync::timeout),
        help("Increase the timeout with --timeout or check the service.")
    )]
    Timeout,

    // ── Misc ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(sweetsync::internal))]
    Internal(String),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(sweetsync::output))]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "the session is no longer connected".into(),
            },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::ItemNotFound { identifier } => CliError::NotFound { identifier },

            CoreError::Rejected { message, status } => CliError::Rejected { status, message },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                status: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile, username } => {
                CliError::NoCredentials { profile, username }
            }
            other => CliError::Config(other),
        }
    }
}
