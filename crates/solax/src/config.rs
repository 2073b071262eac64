//! CLI configuration: a thin wrapper around `solax_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--config, --site, --timeout, etc.).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use solax_api::{Credentials, LocalTarget, SiteList, SolaxClient, endpoint::DEFAULT_LOCAL_PORT};
use solax_core::{SiteConfig, SiteTarget, Topology};

use crate::cli::{GlobalOpts, KindArg, TargetArgs, TopologyArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use solax_config::{Config, Defaults, SiteKind, SiteProfile, config_path};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `SOLAX_CONFIG`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(solax_config::load_config_from(&config_file(global))?)
}

pub fn save(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    solax_config::save_config_to(cfg, &config_file(global))?;
    Ok(())
}

/// Config defaults with `--timeout` / `--attempts` applied.
pub fn effective_defaults(global: &GlobalOpts, cfg: &Config) -> Defaults {
    let mut defaults = cfg.defaults.clone();
    if let Some(timeout) = global.timeout {
        defaults.timeout = timeout;
    }
    if let Some(attempts) = global.attempts {
        defaults.attempts = attempts;
    }
    defaults
}

pub fn client(defaults: &Defaults) -> Result<SolaxClient, CliError> {
    Ok(defaults.client()?)
}

/// Comma-separated site names, for help text.
pub fn available_sites(cfg: &Config) -> String {
    if cfg.sites.is_empty() {
        "(none)".into()
    } else {
        cfg.sites.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Resolve the sites a polling command should run against.
///
/// An ad-hoc target wins; then `--all`; then `--site`, `default_site`, or
/// the only configured site.
pub fn resolve_sites(
    global: &GlobalOpts,
    cfg: &Config,
    target: &TargetArgs,
    token: Option<&str>,
    all: bool,
) -> Result<Vec<SiteConfig>, CliError> {
    let defaults = effective_defaults(global, cfg);

    if target.is_set() {
        let site = ad_hoc_target(target, token)?;
        let name = global.site.clone().unwrap_or_else(|| site.unique_id());
        return Ok(vec![
            SiteConfig::new(name, site)
                .with_scan_interval(Duration::from_secs(defaults.scan_interval.max(1)))
                .with_topology(defaults.topology),
        ]);
    }

    if cfg.sites.is_empty() {
        return Err(CliError::NoConfig {
            path: config_file(global).display().to_string(),
        });
    }

    if all {
        return cfg
            .sites
            .iter()
            .map(|(name, profile)| {
                solax_config::profile_to_site_config(profile, name, &defaults)
                    .map_err(CliError::from)
            })
            .collect();
    }

    let (name, profile) = cfg.site(global.site.as_deref()).map_err(|e| match e {
        solax_config::ConfigError::UnknownSite { name } => CliError::SiteNotFound {
            name,
            available: available_sites(cfg),
        },
        other => other.into(),
    })?;
    Ok(vec![solax_config::profile_to_site_config(
        profile, name, &defaults,
    )?])
}

fn ad_hoc_target(target: &TargetArgs, token: Option<&str>) -> Result<SiteTarget, CliError> {
    if let Some(ref local) = target.local {
        return Ok(SiteTarget::Local(parse_host_port(local)?));
    }

    let (list, site_id) = match (&target.battery, &target.inverter) {
        (Some(id), _) => (SiteList::Battery, id.clone()),
        (_, Some(id)) => (SiteList::Inverter, id.clone()),
        (None, None) => {
            return Err(CliError::Validation {
                field: "target".into(),
                reason: "one of --local, --battery, --inverter is required".into(),
            });
        }
    };
    let token = token.ok_or_else(|| CliError::NoToken {
        site: site_id.clone(),
    })?;
    Ok(SiteTarget::Cloud {
        list,
        credentials: Credentials::new(site_id, SecretString::from(token.to_owned())),
    })
}

/// Identity of a stored profile, matching `SiteTarget::unique_id`, without
/// resolving its token.
pub fn profile_unique_id(profile: &SiteProfile) -> Option<String> {
    match profile.kind {
        SiteKind::Local => {
            let host = profile.ip_address.as_deref()?;
            Some(format!("{host}:{}", profile.port.unwrap_or(DEFAULT_LOCAL_PORT)))
        }
        SiteKind::Battery => Some(format!("{}:{}", SiteList::Battery, profile.site_id.as_deref()?)),
        SiteKind::Inverter => Some(format!(
            "{}:{}",
            SiteList::Inverter,
            profile.site_id.as_deref()?
        )),
    }
}

/// Parse `HOST` or `HOST:PORT`; the port defaults to 80.
pub fn parse_host_port(value: &str) -> Result<LocalTarget, CliError> {
    let (host, port) = match value.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| CliError::Validation {
                field: "local".into(),
                reason: format!("invalid port in '{value}'"),
            })?;
            (host, port)
        }
        None => (value, DEFAULT_LOCAL_PORT),
    };
    if host.is_empty() {
        return Err(CliError::Validation {
            field: "local".into(),
            reason: "host cannot be empty".into(),
        });
    }
    Ok(LocalTarget::new(host, port))
}

impl From<KindArg> for SiteKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Battery => Self::Battery,
            KindArg::Inverter => Self::Inverter,
            KindArg::Local => Self::Local,
        }
    }
}

impl From<TopologyArg> for Topology {
    fn from(topology: TopologyArg) -> Self {
        match topology {
            TopologyArg::Shared => Self::Shared,
            TopologyArg::Independent => Self::Independent,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn host_port_parsing() {
        let t = parse_host_port("192.168.1.50").unwrap();
        assert_eq!((t.host.as_str(), t.port), ("192.168.1.50", 80));

        let t = parse_host_port("inverter.lan:8080").unwrap();
        assert_eq!((t.host.as_str(), t.port), ("inverter.lan", 8080));

        assert!(parse_host_port("inverter.lan:http").is_err());
        assert!(parse_host_port(":80").is_err());
    }

    #[test]
    fn profile_ids_match_target_ids() {
        let local = SiteProfile::local("10.0.0.2", 8080);
        assert_eq!(profile_unique_id(&local).unwrap(), "10.0.0.2:8080");

        let battery = SiteProfile::cloud(SiteKind::Battery, "123");
        assert_eq!(profile_unique_id(&battery).unwrap(), "battery:123");

        let mut broken = SiteProfile::cloud(SiteKind::Inverter, "x");
        broken.site_id = None;
        assert!(profile_unique_id(&broken).is_none());
    }
}
