// ── Metric sources ──
//
// A `MetricSource` is one poll's worth of work: request, validate, extract.
// The coordinator owns a source and drives it on a schedule; it never knows
// which endpoint sits behind it.

use std::future::Future;

use solax_api::{
    BatteryResponse, Credentials, InverterResponse, LocalTarget, SiteList, SolaxClient,
};

use crate::extract;
use crate::model::{
    BATTERY_SENSORS, INVERTER_SENSORS, MetricSnapshot, REALTIME_SENSORS, SensorDescriptor,
};

/// Something a coordinator can poll for a fresh snapshot.
pub trait MetricSource: Send + Sync + 'static {
    /// Short human label for logs, e.g. `"battery 123456"`.
    fn label(&self) -> String;

    /// The sensors this source can populate.
    fn descriptors(&self) -> Vec<SensorDescriptor>;

    /// Perform one complete poll, including request retries.
    fn poll(&self) -> impl Future<Output = Result<MetricSnapshot, solax_api::Error>> + Send;
}

// ── Cloud site list ──────────────────────────────────────────────────

/// Battery or inverter list for one site on the SolaX cloud.
#[derive(Debug, Clone)]
pub struct CloudSource {
    client: SolaxClient,
    credentials: Credentials,
    list: SiteList,
}

impl CloudSource {
    pub fn new(client: SolaxClient, credentials: Credentials, list: SiteList) -> Self {
        Self {
            client,
            credentials,
            list,
        }
    }

    pub fn list(&self) -> SiteList {
        self.list
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl MetricSource for CloudSource {
    fn label(&self) -> String {
        format!("{} {}", self.list, self.credentials.site_id())
    }

    fn descriptors(&self) -> Vec<SensorDescriptor> {
        match self.list {
            SiteList::Battery => BATTERY_SENSORS.to_vec(),
            SiteList::Inverter => INVERTER_SENSORS.to_vec(),
        }
    }

    async fn poll(&self) -> Result<MetricSnapshot, solax_api::Error> {
        match self.list {
            SiteList::Battery => {
                let response: BatteryResponse = self.client.fetch(&self.credentials).await?;
                Ok(extract::battery(&response))
            }
            SiteList::Inverter => {
                let response: InverterResponse = self.client.fetch(&self.credentials).await?;
                Ok(extract::inverter(&response))
            }
        }
    }
}

// ── Local real-time endpoint ─────────────────────────────────────────

/// The inverter's own `realTimeData.htm` page on the LAN.
#[derive(Debug, Clone)]
pub struct LocalSource {
    client: SolaxClient,
    target: LocalTarget,
}

impl LocalSource {
    pub fn new(client: SolaxClient, target: LocalTarget) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &LocalTarget {
        &self.target
    }
}

impl MetricSource for LocalSource {
    fn label(&self) -> String {
        format!("realtime {}", self.target)
    }

    fn descriptors(&self) -> Vec<SensorDescriptor> {
        REALTIME_SENSORS.iter().map(|(d, _)| *d).collect()
    }

    async fn poll(&self) -> Result<MetricSnapshot, solax_api::Error> {
        let response = self.client.realtime(&self.target).await?;
        Ok(extract::realtime(&response))
    }
}

// ── Either ───────────────────────────────────────────────────────────

/// Concrete source built from site configuration.
#[derive(Debug, Clone)]
pub enum SiteSource {
    Cloud(CloudSource),
    Local(LocalSource),
}

impl MetricSource for SiteSource {
    fn label(&self) -> String {
        match self {
            Self::Cloud(s) => s.label(),
            Self::Local(s) => s.label(),
        }
    }

    fn descriptors(&self) -> Vec<SensorDescriptor> {
        match self {
            Self::Cloud(s) => s.descriptors(),
            Self::Local(s) => s.descriptors(),
        }
    }

    async fn poll(&self) -> Result<MetricSnapshot, solax_api::Error> {
        match self {
            Self::Cloud(s) => s.poll().await,
            Self::Local(s) => s.poll().await,
        }
    }
}
