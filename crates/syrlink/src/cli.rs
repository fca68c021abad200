//! Clap derive structures for the `syrlink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use syrlink_core::StatisticsKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// syrlink -- command-line client for SYR Connect water softeners
#[derive(Debug, Parser)]
#[command(
    name = "syrlink",
    version,
    about = "Monitor and control SYR water softeners from the command line",
    long_about = "A CLI for SYR Connect cloud accounts.\n\n\
        Talks to the vendor web services the mobile app uses: encrypted\n\
        XML over HTTPS, with sessions re-established automatically.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account name from the config file
    #[arg(long, short = 'a', env = "SYRLINK_ACCOUNT", global = true)]
    pub account: Option<String>,

    /// Portal username (overrides the account entry)
    #[arg(long, short = 'u', env = "SYRLINK_USERNAME", global = true)]
    pub username: Option<String>,

    /// Web-service root URL (for relays and tests)
    #[arg(long, env = "SYRLINK_BASE_URL", global = true, hide = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SYRLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SYRLINK_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify credentials and show the session
    Login,

    /// List projects on the account
    #[command(alias = "proj")]
    Projects,

    /// List registered softeners
    #[command(alias = "dev", alias = "ls")]
    Devices,

    /// Show current readings, for one device or all
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Poll continuously and print each cycle
    Watch(WatchArgs),

    /// Start a regeneration
    #[command(alias = "regen")]
    Regenerate(RegenerateArgs),

    /// Reset device counters
    Reset(ResetArgs),

    /// Write a raw command value to a device
    Set(SetArgs),

    /// Show water or salt usage statistics
    Stats(StatsArgs),

    /// Manage CLI configuration and accounts
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-Command Arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Device id, serial number or collection id. Omit for all devices.
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polling cycles (default from config, 60)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct RegenerateArgs {
    /// Device id, serial number or collection id
    pub device: String,

    /// Run a multi-regeneration instead of a single one
    #[arg(long)]
    pub multi: bool,
}

#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Device id, serial number or collection id
    pub device: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Device id, serial number or collection id
    pub device: String,

    /// Vendor command name, e.g. setSV1
    pub command: String,

    /// Value to write; numbers and true/false are sent as numbers
    pub value: String,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Device id, serial number or collection id
    pub device: String,

    /// Which series to fetch
    #[arg(long, short = 'k', value_enum, default_value = "water")]
    pub kind: StatKind,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatKind {
    /// Water consumption, litres
    Water,
    /// Salt consumption, kilograms
    Salt,
}

impl From<StatKind> for StatisticsKind {
    fn from(kind: StatKind) -> Self {
        match kind {
            StatKind::Water => Self::Water,
            StatKind::Salt => Self::Salt,
        }
    }
}

// ── Config Subcommand ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Set one account field, e.g. `config set username me@example.com`
    Set { key: String, value: String },

    /// List configured accounts
    Accounts,

    /// Switch the default account
    Use { name: String },

    /// Store a password in the system keyring
    SetPassword {
        /// Account name (defaults to the active account)
        account: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
