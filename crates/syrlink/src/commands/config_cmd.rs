//! Config subcommand handlers.

use dialoguer::{Input, Select};
use syrlink_config::{self as cfg, Account, Config};
use url::Url;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::active_account_name;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn unknown_account(name: String, config: &Config) -> CliError {
    let available: Vec<_> = config.accounts.keys().cloned().collect();
    CliError::UnknownAccount {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// TOML-shaped rendering of the config with secrets masked.
fn format_config_redacted(config: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = config.default_account {
        let _ = writeln!(out, "default_account = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", config.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", config.defaults.color);
    let _ = writeln!(out, "timeout = {}", config.defaults.timeout);
    let _ = writeln!(out, "poll_interval = {}", config.defaults.poll_interval);

    let mut names: Vec<_> = config.accounts.keys().collect();
    names.sort();
    for name in names {
        let account = &config.accounts[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[accounts.{name}]");
        if let Some(ref username) = account.username {
            let _ = writeln!(out, "username = \"{username}\"");
        }
        if account.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env_name) = account.password_env {
            let _ = writeln!(out, "password_env = \"{env_name}\"");
        }
        if let Some(ref base) = account.base_url {
            let _ = writeln!(out, "base_url = \"{base}\"");
        }
        if let Some(timeout) = account.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = account.poll_interval {
            let _ = writeln!(out, "poll_interval = {interval}");
        }
    }

    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = cfg::config_path();
            eprintln!("✨ syrlink — configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Account name
            let account_name: String = Input::new()
                .with_prompt("Account name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Portal credentials
            let username: String = Input::new()
                .with_prompt("SYR Connect username (e-mail)")
                .interact_text()
                .map_err(prompt_err)?;

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

            if username.is_empty() || password.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "username and password cannot be empty".into(),
                });
            }

            // 3. Where to keep the password
            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let password_field = if store_selection == 0 {
                cfg::store_password(&account_name, &password)?;
                eprintln!("   ✓ Password stored in system keyring");
                None // keep it out of the config file
            } else {
                Some(password)
            };

            // 4. Merge into the existing config instead of clobbering
            //    other accounts
            let mut config = cfg::load_config_or_default();
            config.accounts.insert(
                account_name.clone(),
                Account {
                    username: Some(username),
                    password: password_field,
                    ..Account::default()
                },
            );
            config.default_account = Some(account_name.clone());

            cfg::save_config(&config)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active account: {account_name}");
            eprintln!("\n  Test it: syrlink login");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let config = cfg::load_config_or_default();
            let out = output::render_single(&global.output, &config, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut config = cfg::load_config_or_default();
            let account_name = active_account_name(global, &config);

            let account = config
                .accounts
                .entry(account_name.clone())
                .or_insert_with(Account::default);

            match key.as_str() {
                "username" => account.username = Some(value),
                "password" => account.password = Some(value),
                "password_env" | "password-env" => account.password_env = Some(value),
                "base_url" | "base-url" => {
                    value.parse::<Url>().map_err(|e| CliError::Validation {
                        field: "base_url".into(),
                        reason: format!("not a valid URL: {e}"),
                    })?;
                    account.base_url = Some(value);
                }
                "timeout" => {
                    account.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "timeout".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                "poll_interval" | "poll-interval" => {
                    account.poll_interval = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "poll_interval".into(),
                        reason: "must be a number (seconds)".into(),
                    })?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: username, password, \
                             password_env, base_url, timeout, poll_interval"
                        ),
                    });
                }
            }

            cfg::save_config(&config)?;
            eprintln!("✓ Set {key} on account '{account_name}'");
            Ok(())
        }

        // ── Accounts ────────────────────────────────────────────────
        ConfigCommand::Accounts => {
            let config = cfg::load_config_or_default();
            let default = config.default_account.as_deref().unwrap_or("default");
            if config.accounts.is_empty() {
                eprintln!("No accounts configured. Run: syrlink config init");
            } else {
                for name in config.accounts.keys() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut config = cfg::load_config_or_default();

            if !config.accounts.contains_key(&name) {
                return Err(unknown_account(name, &config));
            }

            config.default_account = Some(name.clone());
            cfg::save_config(&config)?;
            eprintln!("✓ Default account set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { account } => {
            let config = cfg::load_config_or_default();
            let account_name = account.unwrap_or_else(|| active_account_name(global, &config));

            if !config.accounts.contains_key(&account_name) {
                return Err(unknown_account(account_name, &config));
            }

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            cfg::store_password(&account_name, &password)?;
            eprintln!("✓ Password stored in system keyring for account '{account_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use syrlink_config::Defaults;

    use super::*;

    #[test]
    fn test_unknown_account_lists_alternatives() {
        let config = Config {
            default_account: Some("home".into()),
            defaults: Defaults::default(),
            accounts: HashMap::from([("home".to_owned(), Account::default())]),
        };
        let err = unknown_account("work".into(), &config);
        match err {
            CliError::UnknownAccount { name, available } => {
                assert_eq!(name, "work");
                assert_eq!(available, "home");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_config_show_masks_the_password() {
        let config = Config {
            default_account: Some("home".into()),
            defaults: Defaults::default(),
            accounts: HashMap::from([(
                "home".to_owned(),
                Account {
                    username: Some("user@example.com".to_owned()),
                    password: Some("geheim".to_owned()),
                    ..Account::default()
                },
            )]),
        };

        let rendered = format_config_redacted(&config);
        assert!(rendered.contains("[accounts.home]"));
        assert!(rendered.contains("password = \"****\""));
        assert!(!rendered.contains("geheim"));
    }
}
