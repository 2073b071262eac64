// ── Config flow ──
//
// Validates a new site entry before the host stores it: duplicates are
// aborted, unreachable or misbehaving endpoints bounce back to the form
// with an error code, and only a successful probe creates the entry.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use solax_api::SolaxClient;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info};

use crate::integration::SiteTarget;
use crate::source::MetricSource;

/// Form field errors are reported against.
pub const BASE_FIELD: &str = "base";

/// User-supplied entry before validation.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: Option<String>,
    pub target: SiteTarget,
}

/// A validated entry, ready to be persisted by the host.
#[derive(Debug, Clone)]
pub struct EntryData {
    pub title: String,
    pub target: SiteTarget,
    /// Number of metrics the probe poll returned.
    pub metrics: usize,
}

impl EntryData {
    pub fn unique_id(&self) -> String {
        self.target.unique_id()
    }
}

/// Why the form was shown again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowError {
    /// Timeout or transport failure while probing.
    CannotConnect,
    /// The endpoint answered but not with a SolaX payload.
    InvalidResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    AlreadyConfigured,
}

/// Outcome of one flow step.
#[derive(Debug, Clone)]
pub enum FlowResult {
    CreateEntry(EntryData),
    ShowForm {
        errors: BTreeMap<&'static str, FlowError>,
    },
    Abort {
        reason: AbortReason,
    },
}

/// Drives creation of one site entry.
#[derive(Debug, Clone)]
pub struct ConfigFlow {
    client: SolaxClient,
    configured: HashSet<String>,
}

impl ConfigFlow {
    /// `configured` holds the unique ids of entries that already exist.
    pub fn new(client: SolaxClient, configured: impl IntoIterator<Item = String>) -> Self {
        Self {
            client,
            configured: configured.into_iter().collect(),
        }
    }

    pub fn is_configured(&self, target: &SiteTarget) -> bool {
        self.configured.contains(&target.unique_id())
    }

    /// Interactive step: duplicate check, then a probe poll.
    pub async fn step_user(&self, input: UserInput) -> FlowResult {
        if self.is_configured(&input.target) {
            debug!(endpoint = %input.target, "entry already configured");
            return FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured,
            };
        }

        let source = input.target.source(&self.client);
        match source.poll().await {
            Ok(snapshot) => {
                let title = input.name.unwrap_or_else(|| input.target.unique_id());
                info!(%title, metrics = snapshot.len(), "creating entry");
                FlowResult::CreateEntry(EntryData {
                    title,
                    target: input.target,
                    metrics: snapshot.len(),
                })
            }
            Err(e) => {
                debug!(endpoint = %input.target, error = %e, "probe failed");
                let error = if e.is_transient() || e.is_transport() {
                    FlowError::CannotConnect
                } else {
                    FlowError::InvalidResponse
                };
                FlowResult::ShowForm {
                    errors: BTreeMap::from([(BASE_FIELD, error)]),
                }
            }
        }
    }

    /// Entry imported from static configuration. Duplicates abort
    /// quietly; nothing is probed.
    pub fn step_import(&self, input: UserInput) -> FlowResult {
        if self.is_configured(&input.target) {
            return FlowResult::Abort {
                reason: AbortReason::AlreadyConfigured,
            };
        }
        let title = input.name.unwrap_or_else(|| input.target.unique_id());
        FlowResult::CreateEntry(EntryData {
            title,
            target: input.target,
            metrics: 0,
        })
    }
}
