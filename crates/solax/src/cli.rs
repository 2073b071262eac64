//! Clap derive structures for the `solax` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// solax -- poll SolaX inverters and batteries from the command line
#[derive(Debug, Parser)]
#[command(
    name = "solax",
    version,
    about = "Poll SolaX solar inverter and battery telemetry",
    long_about = "Polls the SolaX cloud site lists (battery, inverter) or an inverter's\n\
        local real-time page, and shows the values as named, unit-tagged sensors.",
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
    /// Configured site to use
    #[arg(long, short = 's', env = "SOLAX_SITE", global = true)]
    pub site: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SOLAX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SOLAX_OUTPUT",
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

    /// Per-attempt request timeout in seconds (overrides config)
    #[arg(long, env = "SOLAX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Attempts per poll before giving up on timeouts (overrides config)
    #[arg(long, global = true)]
    pub attempts: Option<u32>,
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
    /// YAML
    Yaml,
    /// Plain text, one `name=value` per line (scripting)
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

/// Endpoint kind, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Cloud battery list
    Battery,
    /// Cloud inverter list
    Inverter,
    /// Inverter real-time page on the LAN
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopologyArg {
    /// One poll per site, shared by all sensors
    Shared,
    /// One poll per sensor
    Independent,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll once and print every sensor
    #[command(alias = "get")]
    Fetch(FetchArgs),

    /// Poll on the scan interval and print sensors after every update
    Watch(WatchArgs),

    /// List the sensors an endpoint kind exposes
    Sensors(SensorsArgs),

    /// Manage configured sites
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FETCH / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ad-hoc target that bypasses the config file.
#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct TargetArgs {
    /// Poll an inverter's local page directly (HOST or HOST:PORT)
    #[arg(long, value_name = "HOST[:PORT]")]
    pub local: Option<String>,

    /// Poll a cloud battery list for this site id
    #[arg(long, value_name = "SITE_ID")]
    pub battery: Option<String>,

    /// Poll a cloud inverter list for this site id
    #[arg(long, value_name = "SITE_ID")]
    pub inverter: Option<String>,
}

impl TargetArgs {
    pub fn is_set(&self) -> bool {
        self.local.is_some() || self.battery.is_some() || self.inverter.is_some()
    }
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Access token for an ad-hoc cloud target
    #[arg(long, env = "SOLAX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Fetch every configured site
    #[arg(long, short = 'a', conflicts_with_all = ["local", "battery", "inverter"])]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Access token for an ad-hoc cloud target
    #[arg(long, env = "SOLAX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Watch every configured site
    #[arg(long, short = 'a', conflicts_with_all = ["local", "battery", "inverter"])]
    pub all: bool,

    /// Scan interval in seconds (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Polling topology (overrides config)
    #[arg(long)]
    pub topology: Option<TopologyArg>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SENSORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SensorsArgs {
    /// Endpoint kind
    pub kind: KindArg,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Add a site, probing it before saving (prompts for missing values)
    Add(AddSiteArgs),

    /// List configured sites
    #[command(alias = "ls")]
    List,

    /// Remove a site and its stored token
    #[command(alias = "rm")]
    Remove {
        /// Site name
        name: String,
    },

    /// Display current resolved configuration
    Show,

    /// Set the default site
    Use {
        /// Site name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct AddSiteArgs {
    /// Site name
    pub name: Option<String>,

    /// Endpoint kind
    #[arg(long, short = 'k')]
    pub kind: Option<KindArg>,

    /// Cloud site id (battery / inverter)
    #[arg(long)]
    pub site_id: Option<String>,

    /// Cloud access token (prompted if omitted)
    #[arg(long, env = "SOLAX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Read the token from this environment variable at runtime instead of storing it
    #[arg(long, conflicts_with = "keyring")]
    pub token_env: Option<String>,

    /// Store the token in the system keyring instead of the config file
    #[arg(long)]
    pub keyring: bool,

    /// Inverter address (local)
    #[arg(long)]
    pub ip_address: Option<String>,

    /// Inverter port (local)
    #[arg(long)]
    pub port: Option<u16>,

    /// Scan interval in seconds for this site
    #[arg(long)]
    pub scan_interval: Option<u64>,

    /// Polling topology for this site
    #[arg(long)]
    pub topology: Option<TopologyArg>,

    /// Save without probing the endpoint
    #[arg(long)]
    pub no_verify: bool,

    /// Never prompt; fail if a required value is missing
    #[arg(long)]
    pub non_interactive: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
