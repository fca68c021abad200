//! Shared configuration for the syrlink CLI.
//!
//! TOML accounts, credential resolution (env + keyring + plaintext),
//! and translation to `syrlink_core::AccountConfig`. Kept separate from
//! the core so the polling engine never touches files or keyrings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use syrlink_core::AccountConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for account '{account}'")]
    NoCredentials { account: String },

    #[error("no account named '{account}' in the config file")]
    UnknownAccount { account: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Account used when no `--account` flag is given.
    pub default_account: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named vendor-cloud accounts.
    #[serde(default)]
    pub accounts: HashMap<String, Account>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_account: Some("default".into()),
            defaults: Defaults::default(),
            accounts: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    60
}

/// A named SYR Connect account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Account {
    /// Portal login, usually an e-mail address.
    pub username: Option<String>,

    /// Password in plaintext — prefer the keyring or an env var.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Web-service root override, for relays and tests.
    pub base_url: Option<String>,

    /// Override request timeout, seconds.
    pub timeout: Option<u64>,

    /// Override polling interval, seconds.
    pub poll_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("de", "syrlink", "syrlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("syrlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full `Config` from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load `Config` from an explicit file. Environment variables prefixed
/// `SYRLINK_` override file values either way.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SYRLINK_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
#[must_use]
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Account selection ───────────────────────────────────────────────

/// Pick an account by explicit name, falling back to the configured
/// default and then to `"default"`.
pub fn select_account<'a>(
    config: &'a Config,
    requested: Option<&str>,
) -> Result<(String, &'a Account), ConfigError> {
    let name = requested
        .map(str::to_owned)
        .or_else(|| config.default_account.clone())
        .unwrap_or_else(|| "default".to_owned());
    config
        .accounts
        .get(&name)
        .map(|account| (name.clone(), account))
        .ok_or(ConfigError::UnknownAccount { account: name })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the portal username for an account.
///
/// Order: account entry, then the `SYRLINK_USERNAME` variable.
pub fn resolve_username(account: &Account, account_name: &str) -> Result<String, ConfigError> {
    account
        .username
        .clone()
        .or_else(|| std::env::var("SYRLINK_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            account: account_name.into(),
        })
}

/// Resolve the portal password from the credential chain.
///
/// Order: the account's named env var, `SYRLINK_PASSWORD`, the system
/// keyring, plaintext in the config file.
pub fn resolve_password(
    account: &Account,
    account_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = account.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var("SYRLINK_PASSWORD") {
        return Ok(SecretString::from(val));
    }

    if let Ok(entry) = keyring::Entry::new("syrlink", &format!("{account_name}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref pw) = account.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        account: account_name.into(),
    })
}

/// Store a password in the system keyring for an account.
pub fn store_password(account_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new("syrlink", &format!("{account_name}/password")).map_err(
        |err| ConfigError::Validation {
            field: "keyring".into(),
            reason: err.to_string(),
        },
    )?;
    entry.set_password(password).map_err(|err| ConfigError::Validation {
        field: "keyring".into(),
        reason: err.to_string(),
    })
}

// ── Translation to core settings ────────────────────────────────────

/// Build an [`AccountConfig`] from a config file account.
pub fn account_to_config(
    account: &Account,
    account_name: &str,
) -> Result<AccountConfig, ConfigError> {
    let username = resolve_username(account, account_name)?;
    let password = resolve_password(account, account_name)?;

    let mut config = AccountConfig::new(username, password);
    if let Some(ref base) = account.base_url {
        let url: url::Url = base.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {base}"),
        })?;
        config = config.with_base_url(url);
    }
    if let Some(secs) = account.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.poll_interval =
        Duration::from_secs(account.poll_interval.unwrap_or_else(default_poll_interval));

    Ok(config)
}
