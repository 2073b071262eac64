// ── Field extraction ──
//
// Maps validated vendor payloads to a `MetricSnapshot`. Three strategies,
// one per endpoint shape: positional key codes (battery list), display
// names filtered through an allow-list (inverter list), and slot indices
// into the local real-time `Data` array.

use std::collections::BTreeMap;

use solax_api::{BatteryResponse, DataEntry, InverterResponse, RealTimeData, SiteResponse};

use crate::model::{
    BATTERY_KEYS, Metric, MetricSnapshot, REALTIME_SENSORS, SensorDescriptor, inverter_sensor,
};

/// Look up each key code in `entries`. Every metric in `keys` appears in
/// the output; a key missing from the payload yields `None`.
pub fn by_key_code(entries: &[DataEntry], keys: &[(&str, Metric)]) -> BTreeMap<Metric, Option<f64>> {
    keys.iter()
        .map(|(code, metric)| {
            let value = entries.iter().find(|e| e.key == *code).map(|e| e.value);
            (*metric, value)
        })
        .collect()
}

/// Keep only entries whose display name `lookup` recognises.
pub fn by_name<F>(entries: &[DataEntry], lookup: F) -> BTreeMap<Metric, Option<f64>>
where
    F: Fn(&str) -> Option<SensorDescriptor>,
{
    entries
        .iter()
        .filter_map(|e| lookup(&e.name).map(|d| (d.metric, Some(e.value))))
        .collect()
}

/// Read each slot by index. An index past the end yields `None`.
pub fn by_index(data: &[f64], slots: &[(SensorDescriptor, usize)]) -> BTreeMap<Metric, Option<f64>> {
    slots
        .iter()
        .map(|(d, index)| (d.metric, data.get(*index).copied()))
        .collect()
}

// ── Per-endpoint extractors ──────────────────────────────────────────

pub fn battery(response: &BatteryResponse) -> MetricSnapshot {
    MetricSnapshot::new(by_key_code(response.entries(), &BATTERY_KEYS))
}

pub fn inverter(response: &InverterResponse) -> MetricSnapshot {
    MetricSnapshot::new(by_name(response.entries(), inverter_sensor))
}

pub fn realtime(response: &RealTimeData) -> MetricSnapshot {
    MetricSnapshot::new(by_index(&response.data, &REALTIME_SENSORS))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(key: &str, name: &str, value: f64) -> DataEntry {
        DataEntry {
            key: key.into(),
            name: name.into(),
            value,
            unit: None,
        }
    }

    #[test]
    fn key_code_yields_every_declared_metric() {
        let entries = vec![entry("b1_1", "Voltage", 52.3), entry("b1_3", "Power", -120.0)];
        let values = by_key_code(&entries, &BATTERY_KEYS);

        assert_eq!(values.len(), 5);
        assert_eq!(values[&Metric::Voltage], Some(52.3));
        assert_eq!(values[&Metric::Power], Some(-120.0));
        assert_eq!(values[&Metric::Current], None);
        assert_eq!(values[&Metric::RemainingCapacity], None);
    }

    #[test]
    fn name_lookup_drops_unknown_names() {
        let entries = vec![entry("x", "Foo", 5.0), entry("y", "PV1 Current", 3.2)];
        let values = by_name(&entries, inverter_sensor);

        assert_eq!(values, BTreeMap::from([(Metric::Pv1Current, Some(3.2))]));
    }

    #[test]
    fn name_lookup_is_exact_intersection() {
        let entries = vec![
            entry("a", "Power Now", 1500.0),
            entry("b", "BMS Lost", 0.0),
            entry("c", "pv1 current", 1.0),
        ];
        let values = by_name(&entries, inverter_sensor);

        assert_eq!(values.len(), 2);
        assert!(values.contains_key(&Metric::PowerNow));
        assert!(values.contains_key(&Metric::BmsLost));
    }

    #[test]
    fn index_reads_slots() {
        let mut data = vec![0.0; solax_api::schema::REALTIME_DATA_LEN];
        data[0] = 4.1;
        data[50] = 50.02;
        let values = by_index(&data, &REALTIME_SENSORS);

        assert_eq!(values.len(), REALTIME_SENSORS.len());
        assert_eq!(values[&Metric::Pv1Current], Some(4.1));
        assert_eq!(values[&Metric::GridFrequency], Some(50.02));
        assert_eq!(values[&Metric::EpsPower], Some(0.0));
    }

    #[test]
    fn index_past_end_is_none() {
        let values = by_index(&[1.0], &REALTIME_SENSORS);
        assert_eq!(values[&Metric::Pv1Current], Some(1.0));
        assert_eq!(values[&Metric::Pv2Current], None);
    }
}
