// Transport configuration and endpoint layout.
//
// The backend is a fixed vendor cloud, so the transport surface is
// small: base URL (overridable for tests), timeout, and the exact
// header set the vendor app sends. All five endpoints hang off the
// same base.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::error::Error;

/// Production backend base. All service paths are relative to it.
pub const DEFAULT_BASE_URL: &str = "https://syrconnect.de/WebServices/";

/// User agent of the vendor's iOS app. The backend serves other agents
/// inconsistently.
pub const DEFAULT_USER_AGENT: &str = "SYR/400 CFNetwork/1335.0.3.4 Darwin/21.6.0";

/// Request timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            // The constant is a known-good absolute URL.
            base_url: Url::parse(DEFAULT_BASE_URL).expect("invalid default base URL"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the vendor header set.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("de-DE,de;q=0.9"),
        );

        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .build()?)
    }
}

/// Absolute URLs of the five command endpoints.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: Url,
    pub device_list: Url,
    pub device_status: Url,
    pub set_status: Url,
    pub statistics: Url,
}

impl Endpoints {
    pub fn from_base(base: &Url) -> Result<Self, Error> {
        Ok(Self {
            login: join(base, "Api/SyrApiService.svc/REST/GetProjects")?,
            device_list: join(base, "SyrControlWebServiceTest2.asmx/GetProjectDeviceCollections")?,
            device_status: join(base, "SyrControlWebServiceTest2.asmx/GetDeviceCollectionStatus")?,
            set_status: join(base, "SyrControlWebServiceTest2.asmx/SetDeviceCollectionStatus")?,
            statistics: join(base, "SyrControlWebServiceTest2.asmx/GetLexPlusStatistics")?,
        })
    }
}

/// Join a service path onto the base. A base without a trailing slash
/// would drop its last path segment under `Url::join`, so one is added
/// first.
fn join(base: &Url, path: &str) -> Result<Url, Error> {
    if base.path().ends_with('/') {
        Ok(base.join(path)?)
    } else {
        let mut dir = base.clone();
        dir.set_path(&format!("{}/", base.path()));
        Ok(dir.join(path)?)
    }
}
