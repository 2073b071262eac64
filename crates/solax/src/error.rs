//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use solax_config::ConfigError;
use solax_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Polling ──────────────────────────────────────────────────────
    #[error("Site '{site}' is not ready")]
    #[diagnostic(
        code(solax::not_ready),
        help(
            "The first poll failed, so no sensors were registered.\n\
             Check the site id and token, or that the inverter is reachable.\n\
             `solax watch` keeps retrying on the scan interval."
        )
    )]
    NotReady {
        site: String,
        #[source]
        source: solax_api::Error,
    },

    #[error("Probe of '{target}' failed: {reason}")]
    #[diagnostic(
        code(solax::probe_failed),
        help("Fix the address or credentials, or pass --no-verify to save anyway.")
    )]
    ProbeFailed { target: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(solax::api))]
    Api(#[from] solax_api::Error),

    // ── Sites ────────────────────────────────────────────────────────
    #[error("Site '{name}' not found in configuration")]
    #[diagnostic(
        code(solax::site_not_found),
        help(
            "Available sites: {available}\n\
             Add one with: solax config add"
        )
    )]
    SiteNotFound { name: String, available: String },

    #[error("'{unique_id}' is already configured")]
    #[diagnostic(
        code(solax::already_configured),
        help("Run: solax config list")
    )]
    AlreadyConfigured { unique_id: String },

    #[error("No sites configured")]
    #[diagnostic(
        code(solax::no_config),
        help(
            "Add one with: solax config add\n\
             Or poll ad hoc with --local, --battery, or --inverter.\n\
             Config path: {path}"
        )
    )]
    NoConfig { path: String },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No token configured for site '{site}'")]
    #[diagnostic(
        code(solax::no_token),
        help(
            "Store one with: solax config add {site} --keyring\n\
             Or set token_env in the site profile, or pass --token / SOLAX_TOKEN."
        )
    )]
    NoToken { site: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(solax::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(solax::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotReady { source, .. } | Self::Api(source) if source.is_transient() => {
                exit_code::TIMEOUT
            }
            Self::NotReady { .. } | Self::ProbeFailed { .. } | Self::Api(_) => {
                exit_code::CONNECTION
            }
            Self::NoToken { .. } => exit_code::AUTH,
            Self::SiteNotFound { .. } => exit_code::NOT_FOUND,
            Self::AlreadyConfigured { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotReady { site, source } => CliError::NotReady { site, source },
            CoreError::AlreadyConfigured { unique_id } => CliError::AlreadyConfigured { unique_id },
            CoreError::SiteNotFound { name } => CliError::SiteNotFound {
                name,
                available: String::new(),
            },
            CoreError::CoordinatorClosed { site } => CliError::Validation {
                field: "site".into(),
                reason: format!("coordinator for '{site}' was already shut down"),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Api(e) => CliError::Api(e),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoToken { site } => CliError::NoToken { site },
            ConfigError::UnknownSite { name } => CliError::SiteNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Client(e) => CliError::Api(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
