//! Shared configuration for SolaX tools.
//!
//! TOML site profiles, token resolution (env + keyring + plaintext), and
//! translation to `solax_core::SiteConfig` and a ready `SolaxClient`.

use std::collections::BTreeMap;
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

use solax_api::{
    Credentials, DEFAULT_BASE_URL, LocalTarget, RetryPolicy, SiteList, SolaxClient, TlsMode,
    TransportConfig, endpoint::DEFAULT_LOCAL_PORT,
};
use solax_core::{SiteConfig, SiteTarget, Topology};

/// Keyring service name under which site tokens are stored.
pub const KEYRING_SERVICE: &str = "solax";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no token configured for site '{site}'")]
    NoToken { site: String },

    #[error("site '{name}' is not configured")]
    UnknownSite { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] solax_api::Error),

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
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Site used when none is named on the command line.
    pub default_site: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named site profiles.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteProfile>,
}

impl Config {
    /// Look up a site by name, falling back to `default_site`, then to the
    /// only configured site.
    pub fn site(&self, name: Option<&str>) -> Result<(&str, &SiteProfile), ConfigError> {
        let name = match name.or(self.default_site.as_deref()) {
            Some(name) => name,
            None if self.sites.len() == 1 => self.sites.keys().next().map_or("", String::as_str),
            None => {
                return Err(ConfigError::Validation {
                    field: "site".into(),
                    reason: "no site given and no default_site configured".into(),
                });
            }
        };
        self.sites
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownSite { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Seconds between scheduled polls.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    /// Per-attempt request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Attempts per poll before a timeout is reported.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// One backoff time unit, seconds.
    #[serde(default = "default_backoff_unit")]
    pub backoff_unit: u64,

    /// SolaX cloud base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub topology: Topology,

    #[serde(default = "default_output")]
    pub output: String,

    /// Extra CA certificate (PEM) to trust.
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            timeout: default_timeout(),
            attempts: default_attempts(),
            backoff_unit: default_backoff_unit(),
            base_url: default_base_url(),
            topology: Topology::default(),
            output: default_output(),
            ca_cert: None,
        }
    }
}

fn default_scan_interval() -> u64 {
    30
}
fn default_timeout() -> u64 {
    5
}
fn default_attempts() -> u32 {
    3
}
fn default_backoff_unit() -> u64 {
    1
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_output() -> String {
    "table".into()
}

impl Defaults {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            timeout: Duration::from_secs(self.timeout),
            backoff_unit: Duration::from_secs(self.backoff_unit),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            ..TransportConfig::default()
        }
    }

    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        self.base_url.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", self.base_url),
        })
    }

    /// Reject settings no poll can run with. A zero `backoff_unit` is
    /// allowed and retries immediately.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    /// Build the HTTP client every site shares.
    pub fn client(&self) -> Result<SolaxClient, ConfigError> {
        self.validate()?;
        Ok(SolaxClient::new(
            self.base_url()?,
            &self.transport(),
            self.retry_policy(),
        )?)
    }
}

/// Which endpoint a site profile polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    /// Cloud `BatteryList`.
    Battery,
    /// Cloud `InverterList`.
    Inverter,
    /// Inverter's own real-time page on the LAN.
    Local,
}

/// A named site profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteProfile {
    pub kind: SiteKind,

    /// Cloud site id.
    pub site_id: Option<String>,

    /// Access token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Inverter address for `kind = "local"`.
    pub ip_address: Option<String>,

    /// Inverter port for `kind = "local"`.
    pub port: Option<u16>,

    /// Override `defaults.scan_interval`.
    pub scan_interval: Option<u64>,

    /// Override `defaults.topology`.
    pub topology: Option<Topology>,
}

impl SiteProfile {
    pub fn cloud(kind: SiteKind, site_id: impl Into<String>) -> Self {
        Self {
            kind,
            site_id: Some(site_id.into()),
            token: None,
            token_env: None,
            ip_address: None,
            port: None,
            scan_interval: None,
            topology: None,
        }
    }

    pub fn local(ip_address: impl Into<String>, port: u16) -> Self {
        Self {
            kind: SiteKind::Local,
            site_id: None,
            token: None,
            token_env: None,
            ip_address: Some(ip_address.into()),
            port: Some(port),
            scan_interval: None,
            topology: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "solax", "solax").map_or_else(
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
    p.push("solax");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `SOLAX_*` env vars.
///
/// Env keys nest on `__`, e.g. `SOLAX_DEFAULTS__SCAN_INTERVAL=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SOLAX_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
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

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(site_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{site_name}/token"))
}

/// Resolve a cloud token: `token_env` variable, then keyring, then the
/// plaintext `token` field.
pub fn resolve_token(profile: &SiteProfile, site_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(site_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken {
        site: site_name.into(),
    })
}

/// Store a site token in the system keyring.
pub fn store_token(site_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(site_name)?.set_password(token)?;
    Ok(())
}

/// Remove a site token from the keyring. A missing entry is not an error.
pub fn delete_token(site_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(site_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation to core types ───────────────────────────────────────

/// Build the polling target for a profile, resolving its token.
pub fn profile_to_target(profile: &SiteProfile, site_name: &str) -> Result<SiteTarget, ConfigError> {
    let list = match profile.kind {
        SiteKind::Battery => SiteList::Battery,
        SiteKind::Inverter => SiteList::Inverter,
        SiteKind::Local => {
            let host = profile
                .ip_address
                .clone()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| ConfigError::Validation {
                    field: "ip_address".into(),
                    reason: format!("required for local site '{site_name}'"),
                })?;
            let port = profile.port.unwrap_or(DEFAULT_LOCAL_PORT);
            return Ok(SiteTarget::Local(LocalTarget::new(host, port)));
        }
    };

    let site_id = profile
        .site_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ConfigError::Validation {
            field: "site_id".into(),
            reason: format!("required for cloud site '{site_name}'"),
        })?;
    let token = resolve_token(profile, site_name)?;

    Ok(SiteTarget::Cloud {
        list,
        credentials: Credentials::new(site_id, token),
    })
}

/// Build a `SiteConfig` from a profile, applying global defaults.
pub fn profile_to_site_config(
    profile: &SiteProfile,
    site_name: &str,
    defaults: &Defaults,
) -> Result<SiteConfig, ConfigError> {
    let scan_interval = profile.scan_interval.unwrap_or(defaults.scan_interval);
    if scan_interval == 0 {
        return Err(ConfigError::Validation {
            field: "scan_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let target = profile_to_target(profile, site_name)?;
    Ok(SiteConfig::new(site_name, target)
        .with_scan_interval(Duration::from_secs(scan_interval))
        .with_topology(profile.topology.unwrap_or(defaults.topology)))
}
