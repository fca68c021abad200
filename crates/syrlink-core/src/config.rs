// ── Account configuration ──
//
// One `AccountConfig` describes one SYR Connect account worth of
// polling. The core never reads files or the environment; front ends
// assemble this struct however they like.

use std::time::Duration;

use secrecy::SecretString;
use syrlink_api::Credentials;
use syrlink_api::transport::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, TransportConfig};
use url::Url;

/// Pause between two polling cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Settings for a single vendor-cloud account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Web-service root, normally [`DEFAULT_BASE_URL`].
    pub base_url: Url,
    /// Portal login name, usually an e-mail address.
    pub username: String,
    /// Portal password. Held as a secret so debug output stays clean.
    pub password: SecretString,
    /// Per-request deadline.
    pub timeout: Duration,
    /// Pause between polling cycles driven by [`Coordinator::run`].
    ///
    /// [`Coordinator::run`]: crate::Coordinator::run
    pub poll_interval: Duration,
}

impl AccountConfig {
    /// Settings for `username` against the production cloud.
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            username: username.into(),
            password,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Same account against a different web-service root. Used by tests
    /// and self-hosted relays.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}
