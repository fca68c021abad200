// Session-managed API client.
//
// One `SyrClient` owns the HTTP client, the wire codec, and the
// current session. Commands go through `ensure_valid_session`, which
// reuses a live session lock-free and funnels every (re)login through
// a single gate so concurrent callers never race duplicate logins.
// A command answered with the session-rejected fault is retried exactly
// once after a fresh login; a second rejection surfaces as
// [`Error::SessionExpired`].
//
// Security contract: plaintext credentials and decrypted session ids
// never reach log output at any verbosity. Session ids are not exposed
// outside the crate, and `Debug` impls redact them.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, watch};
use url::Url;

use crate::crypto::WireCodec;
use crate::error::Error;
use crate::parser::{
    self, DeviceRecord, DeviceStatusData, LoginData, ParsedResult, ProjectRecord, ResponseKind,
    StatisticsSeries,
};
use crate::payload::{self, ActionValue, DeviceAction, PayloadBuilder, StatisticsKind};
use crate::transport::{Endpoints, TransportConfig};

/// How long the backend honours a session id. Observed server-side
/// expiry is 30 minutes; the client treats its own sessions as stale at
/// the same age and re-authenticates proactively.
pub const SESSION_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Account credentials for the vendor cloud.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    // Neither half of the pair belongs in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// Lifecycle of the client's session with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been established yet.
    Unauthenticated,
    /// A login round-trip is in flight.
    Authenticating,
    /// A session id is held and considered live.
    Authenticated,
    /// The held session aged out locally and will be replaced.
    Expired,
    /// The backend rejected the held session id.
    Rejected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Expired => write!(f, "expired"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// An established session: the (private) session id plus the projects
/// reported at login.
pub struct Session {
    id: String,
    pub established_at: DateTime<Utc>,
    expires_at: Instant,
    pub projects: Vec<ProjectRecord>,
}

impl Session {
    fn new(login: LoginData, lifetime: Duration) -> Self {
        Self {
            id: login.session_id,
            established_at: Utc::now(),
            expires_at: Instant::now() + lifetime,
            projects: login.projects,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }

    fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Time until this session is treated as stale.
    pub fn expires_in(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

impl fmt::Debug for Session {
    // The session id is deliberately absent.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("established_at", &self.established_at)
            .field("projects", &self.projects.len())
            .finish_non_exhaustive()
    }
}

struct ClientInner {
    http: reqwest::Client,
    endpoints: Endpoints,
    codec: WireCodec,
    payloads: PayloadBuilder,
    credentials: Credentials,
    session: ArcSwapOption<Session>,
    /// Serializes logins; the session slot stays lock-free for readers.
    login_gate: Mutex<()>,
    state_tx: watch::Sender<SessionState>,
    session_lifetime: Duration,
}

impl ClientInner {
    fn set_state(&self, next: SessionState) {
        let prev = self.state_tx.send_replace(next);
        if prev != next {
            tracing::debug!(from = %prev, to = %next, "session state changed");
        }
    }
}

/// Asynchronous client for the encrypted command protocol.
///
/// Cheap to clone; clones share the session and its login gate.
#[derive(Clone)]
pub struct SyrClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for SyrClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyrClient")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SyrClient {
    /// Client against the production backend with the vendor codec.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Self::with_transport(credentials, TransportConfig::default())
    }

    /// Client with custom transport settings (base URL, timeout).
    pub fn with_transport(
        credentials: Credentials,
        transport: TransportConfig,
    ) -> Result<Self, Error> {
        Self::with_codec(credentials, transport, WireCodec::vendor_default())
    }

    /// Client with custom transport and custom wire key material.
    pub fn with_codec(
        credentials: Credentials,
        transport: TransportConfig,
        codec: WireCodec,
    ) -> Result<Self, Error> {
        let endpoints = Endpoints::from_base(&transport.base_url)?;
        let http = transport.build_client()?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                endpoints,
                codec,
                payloads: PayloadBuilder::default(),
                credentials,
                session: ArcSwapOption::empty(),
                login_gate: Mutex::new(()),
                state_tx: watch::Sender::new(SessionState::Unauthenticated),
                session_lifetime: SESSION_LIFETIME,
            }),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    /// Watch lifecycle transitions (login/expiry/rejection).
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// The session currently held, if any (valid or not).
    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.inner.session.load_full()
    }

    /// Force a fresh login regardless of the held session.
    pub async fn login(&self) -> Result<Arc<Session>, Error> {
        let _gate = self.inner.login_gate.lock().await;
        self.login_locked().await
    }

    /// Drop the held session locally. The backend expires it on its
    /// own; there is no logout endpoint to call.
    pub fn logout(&self) {
        self.inner.session.store(None);
        self.inner.set_state(SessionState::Unauthenticated);
        tracing::debug!("session cleared");
    }

    /// Return a live session, logging in if none is held or the held
    /// one has aged out. Concurrent callers share one login.
    pub async fn ensure_valid_session(&self) -> Result<Arc<Session>, Error> {
        if let Some(session) = self.inner.session.load_full() {
            if session.is_valid() {
                return Ok(session);
            }
        }

        let _gate = self.inner.login_gate.lock().await;
        // Another caller may have logged in while this one waited.
        if let Some(session) = self.inner.session.load_full() {
            if session.is_valid() {
                return Ok(session);
            }
        }
        self.login_locked().await
    }

    /// Projects visible to the account, as reported at login.
    pub async fn list_projects(&self) -> Result<Vec<ProjectRecord>, Error> {
        let session = self.ensure_valid_session().await?;
        Ok(session.projects.clone())
    }

    /// Device directory of one project.
    pub async fn list_devices(&self, project_id: &str) -> Result<Vec<DeviceRecord>, Error> {
        let result = self
            .request_with_session(
                &self.inner.endpoints.device_list,
                ResponseKind::DeviceList,
                |session| self.inner.payloads.device_list(session.id(), project_id),
            )
            .await?;
        match result {
            ParsedResult::DeviceList(devices) => Ok(devices),
            _ => Err(Error::decode("mismatched device list response")),
        }
    }

    /// Full status readout of one device collection.
    pub async fn get_device_status(&self, device_id: &str) -> Result<DeviceStatusData, Error> {
        let result = self
            .request_with_session(
                &self.inner.endpoints.device_status,
                ResponseKind::DeviceStatus,
                |session| self.inner.payloads.device_status(session.id(), device_id),
            )
            .await?;
        match result {
            ParsedResult::DeviceStatus(status) => Ok(status),
            _ => Err(Error::decode("mismatched device status response")),
        }
    }

    /// Write one command/value pair to a device collection.
    pub async fn set_device_value(
        &self,
        device_id: &str,
        command: &str,
        value: ActionValue,
    ) -> Result<(), Error> {
        let result = self
            .request_with_session(
                &self.inner.endpoints.set_status,
                ResponseKind::SetAck,
                |session| {
                    self.inner
                        .payloads
                        .set_status(session.id(), device_id, command, &value)
                },
            )
            .await?;
        match result {
            ParsedResult::SetAck => Ok(()),
            _ => Err(Error::decode("mismatched set acknowledgement")),
        }
    }

    /// Dispatch a well-known device action.
    pub async fn send_action(&self, device_id: &str, action: DeviceAction) -> Result<(), Error> {
        tracing::info!(device = %device_id, action = %action, "dispatching device action");
        self.set_device_value(device_id, action.command(), action.value())
            .await
    }

    /// Usage statistics series (water or salt) for one device.
    pub async fn get_statistics(
        &self,
        device_id: &str,
        kind: StatisticsKind,
    ) -> Result<StatisticsSeries, Error> {
        let result = self
            .request_with_session(
                &self.inner.endpoints.statistics,
                ResponseKind::Statistics,
                |session| self.inner.payloads.statistics(session.id(), device_id, kind),
            )
            .await?;
        match result {
            ParsedResult::Statistics(series) => Ok(series),
            _ => Err(Error::decode("mismatched statistics response")),
        }
    }

    // ── Internals ──

    /// Run one authenticated command with the retry-once contract:
    /// a session-rejected fault triggers a single fresh login and one
    /// rebuilt retry; a second rejection is `Error::SessionExpired`.
    async fn request_with_session<F>(
        &self,
        url: &Url,
        kind: ResponseKind,
        build: F,
    ) -> Result<ParsedResult, Error>
    where
        F: Fn(&Session) -> Result<String, Error>,
    {
        let session = self.ensure_valid_session().await?;
        let payload = build(&session)?;
        match self.exchange(url, &payload, kind).await? {
            ParsedResult::Fault(fault) if fault.is_session_rejected() => {
                tracing::debug!(kind = %kind, "session rejected by backend, re-authenticating");
                self.invalidate_session(&session);
                let fresh = self.ensure_valid_session().await?;
                let payload = build(&fresh)?;
                match self.exchange(url, &payload, kind).await? {
                    ParsedResult::Fault(fault) if fault.is_session_rejected() => {
                        Err(Error::SessionExpired)
                    }
                    ParsedResult::Fault(fault) => Err(Error::Vendor {
                        code: fault.code,
                        message: fault.message,
                    }),
                    other => Ok(other),
                }
            }
            ParsedResult::Fault(fault) => Err(Error::Vendor {
                code: fault.code,
                message: fault.message,
            }),
            other => Ok(other),
        }
    }

    /// One encrypt/POST/decrypt/parse round-trip.
    async fn exchange(
        &self,
        url: &Url,
        payload: &str,
        kind: ResponseKind,
    ) -> Result<ParsedResult, Error> {
        let wire = self.inner.codec.encrypt(payload);
        tracing::debug!(endpoint = %url.path(), kind = %kind, "dispatching command");

        let response = self
            .inner
            .http
            .post(url.clone())
            .form(&[("xml", wire.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let document = self.inner.codec.decrypt(&body)?;
        parser::parse(&document, kind)
    }

    /// Caller must hold the login gate.
    async fn login_locked(&self) -> Result<Arc<Session>, Error> {
        if self.inner.session.load().is_some() {
            self.inner.set_state(SessionState::Expired);
            self.inner.session.store(None);
        }
        self.inner.set_state(SessionState::Authenticating);

        match self.perform_login().await {
            Ok(session) => {
                let session = Arc::new(session);
                self.inner.session.store(Some(Arc::clone(&session)));
                self.inner.set_state(SessionState::Authenticated);
                tracing::info!(
                    projects = session.projects.len(),
                    lifetime_secs = self.inner.session_lifetime.as_secs(),
                    "session established"
                );
                Ok(session)
            }
            Err(err) => {
                let next = if err.is_auth() {
                    SessionState::Rejected
                } else {
                    SessionState::Unauthenticated
                };
                self.inner.set_state(next);
                tracing::warn!(error = %err, "login failed");
                Err(err)
            }
        }
    }

    async fn perform_login(&self) -> Result<Session, Error> {
        let payload = payload::login_payload(
            &self.inner.credentials.username,
            self.inner.credentials.password.expose_secret(),
            &payload::login_timestamp(),
        )?;

        match self
            .exchange(&self.inner.endpoints.login, &payload, ResponseKind::Login)
            .await
        {
            Ok(ParsedResult::Login(login)) => {
                Ok(Session::new(login, self.inner.session_lifetime))
            }
            Ok(ParsedResult::Fault(fault)) => Err(Error::Authentication {
                message: fault.to_string(),
            }),
            Ok(_) => Err(Error::decode("mismatched login response")),
            // A garbled login answer means the credentials were not
            // accepted in any usable way.
            Err(Error::Decode { message }) => Err(Error::Authentication {
                message: format!("unusable login response: {message}"),
            }),
            Err(err) => Err(err),
        }
    }

    /// Drop the session a rejected command was built on, unless a newer
    /// login already replaced it.
    fn invalidate_session(&self, stale: &Arc<Session>) {
        let current = self.inner.session.load();
        if let Some(current) = current.as_ref() {
            if Arc::ptr_eq(current, stale) {
                self.inner.session.store(None);
                self.inner.set_state(SessionState::Rejected);
            }
        }
    }

    #[cfg(test)]
    fn inject_session(&self, session: Session) {
        self.inner.session.store(Some(Arc::new(session)));
        self.inner.set_state(SessionState::Authenticated);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("user@example.com", SecretString::from("secret".to_owned()))
    }

    fn expired_session() -> Session {
        Session {
            id: "stale-session".to_owned(),
            established_at: Utc::now(),
            expires_at: Instant::now(),
            projects: vec![ProjectRecord {
                id: "p-1".to_owned(),
                name: "Zuhause".to_owned(),
            }],
        }
    }

    fn client_against(server: &MockServer) -> SyrClient {
        let transport = TransportConfig {
            base_url: Url::parse(&format!("{}/WebServices/", server.uri())).unwrap(),
            ..TransportConfig::default()
        };
        SyrClient::with_transport(credentials(), transport).unwrap()
    }

    fn encrypted(doc: &str) -> String {
        WireCodec::vendor_default().encrypt(doc)
    }

    const LOGIN_DOC: &str = r#"<sc><api version="1.0"><usr id="fresh-session"/><prs><pre id="p-1" n="Zuhause"/></prs></api></sc>"#;

    #[test]
    fn session_validity_window() {
        let session = Session::new(
            LoginData {
                session_id: "s".to_owned(),
                projects: Vec::new(),
            },
            Duration::from_secs(60),
        );
        let now = Instant::now();
        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(now + Duration::from_secs(61)));
    }

    #[test]
    fn session_debug_omits_the_id() {
        let session = expired_session();
        let output = format!("{session:?}");
        assert!(!output.contains("stale-session"));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let output = format!("{:?}", credentials());
        assert!(!output.contains("user@example.com"));
        assert!(!output.contains("secret"));
    }

    #[tokio::test]
    async fn expired_session_is_replaced_before_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/WebServices/Api/SyrApiService.svc/REST/GetProjects"))
            .respond_with(ResponseTemplate::new(200).set_body_string(encrypted(LOGIN_DOC)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_against(&server);
        client.inject_session(expired_session());

        let session = client.ensure_valid_session().await.unwrap();
        assert!(session.is_valid());
        assert_eq!(client.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn valid_session_is_reused_without_a_round_trip() {
        // No mocks mounted: any request would 404 and fail the test.
        let server = MockServer::start().await;
        let client = client_against(&server);
        client.inject_session(Session::new(
            LoginData {
                session_id: "live".to_owned(),
                projects: vec![ProjectRecord {
                    id: "p-1".to_owned(),
                    name: "Zuhause".to_owned(),
                }],
            },
            Duration::from_secs(600),
        ));

        let projects = client.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Zuhause");
    }

    #[tokio::test]
    async fn logout_clears_state_and_session() {
        let server = MockServer::start().await;
        let client = client_against(&server);
        client.inject_session(expired_session());

        client.logout();
        assert_eq!(client.state(), SessionState::Unauthenticated);
        assert!(client.current_session().is_none());
    }

    #[tokio::test]
    async fn state_transitions_are_observable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/WebServices/Api/SyrApiService.svc/REST/GetProjects"))
            .respond_with(ResponseTemplate::new(200).set_body_string(encrypted(LOGIN_DOC)))
            .mount(&server)
            .await;

        let client = client_against(&server);
        let mut states = client.state_changes();
        assert_eq!(*states.borrow_and_update(), SessionState::Unauthenticated);

        client.login().await.unwrap();
        states.changed().await.unwrap();
        // Authenticating may already be superseded by Authenticated.
        let seen = *states.borrow_and_update();
        assert!(
            seen == SessionState::Authenticating || seen == SessionState::Authenticated,
            "unexpected state {seen}"
        );
        assert_eq!(client.state(), SessionState::Authenticated);
    }
}
