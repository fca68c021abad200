//! CLI-side configuration glue.
//!
//! Account selection honoring `--account`, flag overrides, and
//! translation to `syrlink_core::AccountConfig` via `syrlink-config`.

use std::time::Duration;

use syrlink_config::{self as cfg, Account, Config};
use syrlink_core::AccountConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active account name from CLI flags and config.
pub fn active_account_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .account
        .clone()
        .or_else(|| config.default_account.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build an [`AccountConfig`] from the config file, the active account,
/// and CLI flag overrides.
///
/// Works without a config file too: `--username` plus the
/// `SYRLINK_PASSWORD` variable (or a keyring entry) are enough.
pub fn build_account_config(global: &GlobalOpts) -> Result<AccountConfig, CliError> {
    let file = cfg::load_config_or_default();
    let name = active_account_name(global, &file);

    let account = match file.accounts.get(&name) {
        Some(entry) => {
            let mut account = entry.clone();
            if let Some(ref username) = global.username {
                account.username = Some(username.clone());
            }
            account
        }
        None => Account {
            username: global.username.clone(),
            ..Account::default()
        },
    };

    let mut config = cfg::account_to_config(&account, &name)?;

    if let Some(ref base) = global.base_url {
        let url: url::Url = base.parse().map_err(|_| CliError::Validation {
            field: "base-url".into(),
            reason: format!("invalid URL: {base}"),
        })?;
        config.base_url = url;
    }
    config.timeout = Duration::from_secs(global.timeout);

    Ok(config)
}
