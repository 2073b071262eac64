// ── Sensor adapter ──
//
// Read-only view of one metric. A sensor never triggers a poll; it reads
// the coordinator's latest published state through a watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::coordinator::EndpointState;
use crate::model::{Metric, SensorDescriptor};

/// One named, unit-tagged metric exposed to the host.
#[derive(Debug, Clone)]
pub struct Sensor {
    descriptor: SensorDescriptor,
    receiver: watch::Receiver<Arc<EndpointState>>,
}

/// Point-in-time view of a sensor, suitable for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub value: Option<f64>,
    pub stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Sensor {
    pub fn new(descriptor: SensorDescriptor, receiver: watch::Receiver<Arc<EndpointState>>) -> Self {
        Self {
            descriptor,
            receiver,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name()
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.descriptor.unit
    }

    pub fn metric(&self) -> Metric {
        self.descriptor.metric
    }

    pub fn descriptor(&self) -> SensorDescriptor {
        self.descriptor
    }

    /// Value from the most recent successful snapshot, kept while stale.
    pub fn value(&self) -> Option<f64> {
        self.receiver.borrow().value(self.descriptor.metric)
    }

    /// Value only if the latest poll succeeded.
    pub fn fresh_value(&self) -> Option<f64> {
        let state = self.receiver.borrow();
        if state.fresh {
            state.value(self.descriptor.metric)
        } else {
            None
        }
    }

    pub fn is_stale(&self) -> bool {
        self.receiver.borrow().is_stale()
    }

    /// Whether the latest poll succeeded.
    pub fn available(&self) -> bool {
        self.receiver.borrow().fresh
    }

    pub fn reading(&self) -> SensorReading {
        let state = self.receiver.borrow();
        self.reading_from(&state)
    }

    /// Wait for the coordinator's next poll to complete.
    /// Returns `None` once the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<SensorReading> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        Some(self.reading_from(&state))
    }

    fn reading_from(&self, state: &EndpointState) -> SensorReading {
        SensorReading {
            name: self.name(),
            unit: self.unit(),
            value: state.value(self.descriptor.metric),
            stale: state.is_stale(),
            updated_at: state.last_success,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{BATTERY_SENSORS, MetricSnapshot};

    fn state(voltage: Option<f64>, fresh: bool) -> Arc<EndpointState> {
        Arc::new(EndpointState {
            snapshot: voltage
                .map(|v| Arc::new([(Metric::Voltage, Some(v))].into_iter().collect::<MetricSnapshot>())),
            fresh,
            ..EndpointState::default()
        })
    }

    #[test]
    fn never_fetched_is_none() {
        let (_tx, rx) = watch::channel(Arc::new(EndpointState::default()));
        let sensor = Sensor::new(BATTERY_SENSORS[0], rx);

        assert_eq!(sensor.name(), "Voltage");
        assert_eq!(sensor.unit(), Some("V"));
        assert_eq!(sensor.value(), None);
        assert!(!sensor.available());
    }

    #[test]
    fn stale_keeps_value_but_not_fresh_value() {
        let (_tx, rx) = watch::channel(state(Some(52.3), false));
        let sensor = Sensor::new(BATTERY_SENSORS[0], rx);

        assert_eq!(sensor.value(), Some(52.3));
        assert_eq!(sensor.fresh_value(), None);
        assert!(sensor.is_stale());
    }

    #[test]
    fn metric_missing_from_snapshot_is_none() {
        let (_tx, rx) = watch::channel(state(Some(52.3), true));
        let sensor = Sensor::new(BATTERY_SENSORS[2], rx);

        assert_eq!(sensor.value(), None);
        assert_eq!(sensor.reading().name, "Power");
    }

    #[tokio::test]
    async fn changed_returns_none_after_sender_drops() {
        let (tx, rx) = watch::channel(state(None, false));
        let mut sensor = Sensor::new(BATTERY_SENSORS[0], rx);

        tx.send_replace(state(Some(48.0), true));
        assert_eq!(sensor.changed().await.map(|r| r.value), Some(Some(48.0)));

        drop(tx);
        assert!(sensor.changed().await.is_none());
    }
}
