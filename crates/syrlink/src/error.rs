//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use syrlink_config::ConfigError;
use syrlink_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 6;
    pub const TIMEOUT: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach SYR Connect")]
    #[diagnostic(
        code(syrlink::connection_failed),
        help(
            "Check your network connection and that syrconnect.de is reachable.\n\
             Detail: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(syrlink::timeout),
        help("Increase the deadline with --timeout or try again later.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(syrlink::auth_failed),
        help(
            "Verify username and password for your SYR Connect account.\n\
             Update the stored password with: syrlink config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for account '{account}'")]
    #[diagnostic(
        code(syrlink::no_credentials),
        help(
            "Configure credentials with: syrlink config init\n\
             Or set the SYRLINK_USERNAME and SYRLINK_PASSWORD variables."
        )
    )]
    NoCredentials { account: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(syrlink::not_found),
        help("Run: syrlink devices to see registered softeners")
    )]
    NotFound { identifier: String },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("Rejected by SYR Connect: {message}")]
    #[diagnostic(code(syrlink::rejected))]
    Rejected { message: String },

    #[error("Protocol failure: {message}")]
    #[diagnostic(
        code(syrlink::protocol),
        help(
            "The backend answered in an unexpected format.\n\
             Re-run with -vv to see the exchange; the vendor API may have changed."
        )
    )]
    Protocol { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(syrlink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Account '{name}' not found in configuration")]
    #[diagnostic(
        code(syrlink::unknown_account),
        help(
            "Available accounts: {available}\n\
             Create one with: syrlink config init"
        )
    )]
    UnknownAccount { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(syrlink::config), help("Inspect it with: syrlink config show"))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(syrlink::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => Self::ConnectionFailed { reason },

            CoreError::Timeout => Self::Timeout,

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::DeviceNotFound { identifier } => Self::NotFound { identifier },

            CoreError::Protocol { message } => Self::Protocol { message },

            CoreError::Rejected { message } => Self::Rejected { message },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => Self::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { account } => Self::NoCredentials { account },

            ConfigError::UnknownAccount { account } => Self::UnknownAccount {
                name: account,
                available: String::new(),
            },

            ConfigError::Validation { field, reason } => Self::Validation { field, reason },

            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
