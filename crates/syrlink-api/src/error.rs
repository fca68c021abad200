use thiserror::Error;

/// Top-level error type for the `syrlink-api` crate.
///
/// Covers every failure mode of the encrypted command protocol:
/// payload construction, crypto/wire decoding, authentication, session
/// lifecycle, and transport. `syrlink-core` maps these into per-device
/// or cycle-level outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Input validation ────────────────────────────────────────────
    /// Malformed input to payload construction (caller's fault).
    #[error("Invalid request field: {message}")]
    Validation { message: String },

    // ── Protocol decoding ───────────────────────────────────────────
    /// Response could not be decrypted or parsed into the expected shape.
    #[error("Protocol decode error: {message}")]
    Decode { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, locked account, unusable login
    /// response).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session rejected by the server even after one fresh login.
    #[error("Session expired -- re-authentication did not resolve it")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// Network/transport failure (timeout, refused, non-2xx status).
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Vendor application errors ───────────────────────────────────
    /// Typed pass-through of the vendor's `<msg c v/>` fault channel
    /// (codes other than the session/credential ones handled above).
    #[error("Vendor fault {code}: {message}")]
    Vendor { code: String, message: String },
}

impl Error {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if this error indicates the credential set itself
    /// was rejected and the host should prompt for re-entry.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient fault that a later poll
    /// cycle may clear on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_timeout() || e.is_connect() || e.is_status(),
            Self::Decode { .. } | Self::SessionExpired | Self::Vendor { .. } => true,
            _ => false,
        }
    }

    /// Extract the vendor fault code, if this error carries one.
    pub fn vendor_code(&self) -> Option<&str> {
        match self {
            Self::Vendor { code, .. } => Some(code),
            _ => None,
        }
    }
}
