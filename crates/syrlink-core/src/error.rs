// ── Core error types ──
//
// User-facing failures for everything above the wire layer. Callers of
// syrlink-core never see raw HTTP or XML errors; the conversion from
// `syrlink_api::Error` folds those into domain-level variants here.

use thiserror::Error;

/// Errors surfaced by the coordinator and domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ──
    /// The vendor cloud could not be reached.
    #[error("cannot reach SYR Connect: {reason}")]
    ConnectionFailed { reason: String },

    /// A request ran past its deadline.
    #[error("request to SYR Connect timed out")]
    Timeout,

    /// Login was refused or the session could not be re-established.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──
    /// No registered device matches the given identifier.
    #[error("unknown device: {identifier}")]
    DeviceNotFound { identifier: String },

    /// The backend answered, but with something we cannot make sense of.
    #[error("protocol failure: {message}")]
    Protocol { message: String },

    // ── Operation errors ──
    /// The backend understood the request and refused it.
    #[error("rejected by SYR Connect: {message}")]
    Rejected { message: String },

    /// A request was malformed before it ever left this process.
    #[error("invalid request: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ──
    /// The account configuration is unusable.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// True for failures where a later retry is plausible.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout | Self::Protocol { .. }
        )
    }
}

impl From<syrlink_api::Error> for CoreError {
    fn from(err: syrlink_api::Error) -> Self {
        match err {
            syrlink_api::Error::Authentication { message } => {
                Self::AuthenticationFailed { message }
            }
            syrlink_api::Error::SessionExpired => Self::AuthenticationFailed {
                message: "session rejected twice in a row".to_owned(),
            },
            syrlink_api::Error::Validation { message } => Self::ValidationFailed { message },
            syrlink_api::Error::Decode { message } => Self::Protocol { message },
            syrlink_api::Error::Connection(source) => {
                if source.is_timeout() {
                    Self::Timeout
                } else {
                    Self::ConnectionFailed {
                        reason: source.to_string(),
                    }
                }
            }
            syrlink_api::Error::InvalidUrl(source) => Self::Config {
                message: format!("invalid URL: {source}"),
            },
            syrlink_api::Error::Vendor { code, message } => Self::Rejected {
                message: format!("fault {code}: {message}"),
            },
        }
    }
}
