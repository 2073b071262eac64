// ── Site setup and registry ──
//
// Turns a `SiteConfig` into running coordinators plus their sensors. A
// site whose startup poll fails registers nothing and reports `NotReady`
// so the host can retry later.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solax_api::{Credentials, LocalTarget, SiteList, SolaxClient};
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::coordinator::{Coordinator, DEFAULT_SCAN_INTERVAL, PollContext};
use crate::error::CoreError;
use crate::sensor::Sensor;
use crate::source::{CloudSource, LocalSource, MetricSource, SiteSource};

/// Which endpoint a site polls.
#[derive(Debug, Clone)]
pub enum SiteTarget {
    Cloud {
        list: SiteList,
        credentials: Credentials,
    },
    Local(LocalTarget),
}

impl SiteTarget {
    /// Identity used to reject duplicate entries.
    pub fn unique_id(&self) -> String {
        match self {
            Self::Cloud { list, credentials } => format!("{list}:{}", credentials.site_id()),
            Self::Local(target) => target.to_string(),
        }
    }

    /// Build the polling source for this target.
    pub fn source(&self, client: &SolaxClient) -> SiteSource {
        match self {
            Self::Cloud { list, credentials } => SiteSource::Cloud(CloudSource::new(
                client.clone(),
                credentials.clone(),
                *list,
            )),
            Self::Local(target) => {
                SiteSource::Local(LocalSource::new(client.clone(), target.clone()))
            }
        }
    }
}

impl fmt::Display for SiteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud { list, credentials } => {
                write!(f, "cloud {list} list, site {}", credentials.site_id())
            }
            Self::Local(target) => write!(f, "local {target}"),
        }
    }
}

/// How sensors of one site are fed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Topology {
    /// One coordinator per site; every sensor shares its poll.
    #[default]
    Shared,
    /// One coordinator per sensor; each sensor polls on its own.
    Independent,
}

/// Everything needed to set up one site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    pub target: SiteTarget,
    pub scan_interval: Duration,
    pub topology: Topology,
}

impl SiteConfig {
    pub fn new(name: impl Into<String>, target: SiteTarget) -> Self {
        Self {
            name: name.into(),
            target,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            topology: Topology::default(),
        }
    }

    pub fn with_scan_interval(mut self, scan_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
}

// ── Site handle ──────────────────────────────────────────────────────

/// A running site: its coordinators and the sensors they feed.
#[derive(Debug)]
pub struct SiteHandle {
    config: SiteConfig,
    coordinators: Vec<Coordinator<SiteSource>>,
    sensors: Vec<Sensor>,
}

impl SiteHandle {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn unique_id(&self) -> String {
        self.config.target.unique_id()
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn coordinators(&self) -> &[Coordinator<SiteSource>] {
        &self.coordinators
    }

    /// Poll every coordinator now. Failures mark data stale.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        for coordinator in &self.coordinators {
            coordinator.refresh(PollContext::Scheduled).await?;
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        for coordinator in &self.coordinators {
            coordinator.shutdown().await;
        }
        info!(site = %self.config.name, "site stopped");
    }
}

/// Build coordinators for `config`, run their startup polls, and return the
/// site's sensors. On any startup failure nothing stays running.
pub async fn setup_site(client: &SolaxClient, config: SiteConfig) -> Result<SiteHandle, CoreError> {
    let source = config.target.source(client);
    info!(
        site = %config.name,
        endpoint = %config.target,
        topology = %config.topology,
        "setting up site"
    );

    let coordinators = match config.topology {
        Topology::Shared => vec![Coordinator::new(
            config.name.clone(),
            source,
            config.scan_interval,
        )],
        Topology::Independent => source
            .descriptors()
            .into_iter()
            .map(|d| {
                Coordinator::with_descriptors(
                    format!("{}/{}", config.name, d.metric),
                    source.clone(),
                    config.scan_interval,
                    vec![d],
                )
            })
            .collect(),
    };

    // Cancels every started coordinator if this future is dropped mid-setup.
    let mut guards = Vec::with_capacity(coordinators.len());
    for (started, coordinator) in coordinators.iter().enumerate() {
        guards.push(coordinator.cancel_on_drop());
        if let Err(e) = coordinator.start().await {
            warn!(site = %config.name, error = %e, "site setup failed");
            for running in &coordinators[..started] {
                running.shutdown().await;
            }
            return Err(match e {
                CoreError::NotReady { source, .. } => CoreError::NotReady {
                    site: config.name.clone(),
                    source,
                },
                other => other,
            });
        }
    }

    for guard in guards {
        let _ = guard.disarm();
    }
    let sensors = coordinators.iter().flat_map(Coordinator::sensors).collect();
    Ok(SiteHandle {
        config,
        coordinators,
        sensors,
    })
}

// ── Registry ─────────────────────────────────────────────────────────

/// All running sites, keyed by name.
#[derive(Debug)]
pub struct Integration {
    client: SolaxClient,
    sites: BTreeMap<String, SiteHandle>,
}

impl Integration {
    pub fn new(client: SolaxClient) -> Self {
        Self {
            client,
            sites: BTreeMap::new(),
        }
    }

    pub fn client(&self) -> &SolaxClient {
        &self.client
    }

    /// Set up and register a site. Rejects a name or target that is
    /// already registered.
    pub async fn add_site(&mut self, config: SiteConfig) -> Result<&SiteHandle, CoreError> {
        let unique_id = config.target.unique_id();
        if self.sites.contains_key(&config.name)
            || self.sites.values().any(|s| s.unique_id() == unique_id)
        {
            return Err(CoreError::AlreadyConfigured { unique_id });
        }

        let handle = setup_site(&self.client, config).await?;
        let name = handle.name().to_owned();
        Ok(self.sites.entry(name).or_insert(handle))
    }

    pub async fn remove_site(&mut self, name: &str) -> Result<(), CoreError> {
        let handle = self.sites.remove(name).ok_or_else(|| CoreError::SiteNotFound {
            name: name.to_owned(),
        })?;
        handle.shutdown().await;
        Ok(())
    }

    pub fn site(&self, name: &str) -> Option<&SiteHandle> {
        self.sites.get(name)
    }

    pub fn sites(&self) -> impl Iterator<Item = &SiteHandle> {
        self.sites.values()
    }

    pub fn unique_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.sites.values().map(SiteHandle::unique_id)
    }

    pub async fn shutdown_all(&mut self) {
        for (_, handle) in std::mem::take(&mut self.sites) {
            handle.shutdown().await;
        }
    }
}
