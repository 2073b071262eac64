// ── Sensor descriptor tables ──
//
// One static table per endpoint variant. Tables are the single source of
// truth for which sensors a site exposes and which unit each one carries.

use serde::Serialize;

use super::metric::Metric;

pub const VOLT: &str = "V";
pub const AMPERE: &str = "A";
pub const WATT: &str = "W";
pub const CELSIUS: &str = "°C";
pub const PERCENT: &str = "%";
pub const KILOWATT_HOUR: &str = "kWh";
pub const HERTZ: &str = "Hz";

/// A metric plus the unit its sensor reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SensorDescriptor {
    pub metric: Metric,
    pub unit: Option<&'static str>,
}

impl SensorDescriptor {
    pub const fn new(metric: Metric, unit: &'static str) -> Self {
        Self {
            metric,
            unit: Some(unit),
        }
    }

    pub const fn unitless(metric: Metric) -> Self {
        Self { metric, unit: None }
    }

    pub fn name(&self) -> &'static str {
        self.metric.name()
    }
}

// ── Battery list ─────────────────────────────────────────────────────

/// Battery `dataDict` key codes, in sensor order.
pub const BATTERY_KEYS: [(&str, Metric); 5] = [
    ("b1_1", Metric::Voltage),
    ("b1_2", Metric::Current),
    ("b1_3", Metric::Power),
    ("b1_4", Metric::Temperature),
    ("b1_5", Metric::RemainingCapacity),
];

pub const BATTERY_SENSORS: [SensorDescriptor; 5] = [
    SensorDescriptor::new(Metric::Voltage, VOLT),
    SensorDescriptor::new(Metric::Current, AMPERE),
    SensorDescriptor::new(Metric::Power, WATT),
    SensorDescriptor::new(Metric::Temperature, CELSIUS),
    SensorDescriptor::new(Metric::RemainingCapacity, PERCENT),
];

// ── Inverter list ────────────────────────────────────────────────────

/// Allow-list for the inverter `dataDict`: entries whose `name` is not
/// listed here are dropped.
pub const INVERTER_SENSORS: [SensorDescriptor; 20] = [
    SensorDescriptor::new(Metric::Pv1Current, AMPERE),
    SensorDescriptor::new(Metric::Pv2Current, AMPERE),
    SensorDescriptor::new(Metric::Pv1Voltage, VOLT),
    SensorDescriptor::new(Metric::Pv2Voltage, VOLT),
    SensorDescriptor::new(Metric::Pv1InputPower, WATT),
    SensorDescriptor::new(Metric::Pv2InputPower, WATT),
    SensorDescriptor::new(Metric::OutputCurrent, AMPERE),
    SensorDescriptor::new(Metric::NetworkVoltage, VOLT),
    SensorDescriptor::new(Metric::PowerNow, WATT),
    SensorDescriptor::new(Metric::ExportedPower, WATT),
    SensorDescriptor::new(Metric::ExportedEnergy, KILOWATT_HOUR),
    SensorDescriptor::new(Metric::GridConsumption, KILOWATT_HOUR),
    SensorDescriptor::new(Metric::AcFrequency, HERTZ),
    SensorDescriptor::new(Metric::TodayEnergy, KILOWATT_HOUR),
    SensorDescriptor::new(Metric::TotalEnergy, KILOWATT_HOUR),
    SensorDescriptor::new(Metric::EpsVoltage, VOLT),
    SensorDescriptor::new(Metric::EpsCurrent, AMPERE),
    SensorDescriptor::new(Metric::EpsPower, WATT),
    SensorDescriptor::new(Metric::EpsFrequency, HERTZ),
    SensorDescriptor::unitless(Metric::BmsLost),
];

/// Look up an inverter `dataDict` name in the allow-list.
pub fn inverter_sensor(name: &str) -> Option<SensorDescriptor> {
    INVERTER_SENSORS
        .iter()
        .find(|d| d.metric.name() == name)
        .copied()
}

// ── Local real-time data ─────────────────────────────────────────────

/// Sensor + slot index into the real-time `Data` array.
pub const REALTIME_SENSORS: [(SensorDescriptor, usize); 24] = [
    (SensorDescriptor::new(Metric::Pv1Current, AMPERE), 0),
    (SensorDescriptor::new(Metric::Pv2Current, AMPERE), 1),
    (SensorDescriptor::new(Metric::Pv1Voltage, VOLT), 2),
    (SensorDescriptor::new(Metric::Pv2Voltage, VOLT), 3),
    (SensorDescriptor::new(Metric::OutputCurrent, AMPERE), 4),
    (SensorDescriptor::new(Metric::NetworkVoltage, VOLT), 5),
    (SensorDescriptor::new(Metric::PowerNow, WATT), 6),
    (SensorDescriptor::new(Metric::InverterTemperature, CELSIUS), 7),
    (SensorDescriptor::new(Metric::TodayEnergy, KILOWATT_HOUR), 8),
    (SensorDescriptor::new(Metric::TotalEnergy, KILOWATT_HOUR), 9),
    (SensorDescriptor::new(Metric::ExportedPower, WATT), 10),
    (SensorDescriptor::new(Metric::Pv1Power, WATT), 11),
    (SensorDescriptor::new(Metric::Pv2Power, WATT), 12),
    (SensorDescriptor::new(Metric::BatteryVoltage, VOLT), 13),
    (SensorDescriptor::new(Metric::BatteryCurrent, AMPERE), 14),
    (SensorDescriptor::new(Metric::BatteryPower, WATT), 15),
    (SensorDescriptor::new(Metric::BatteryTemperature, CELSIUS), 16),
    (SensorDescriptor::new(Metric::BatteryRemainingCapacity, PERCENT), 17),
    (SensorDescriptor::new(Metric::BatteryEnergy, KILOWATT_HOUR), 19),
    (SensorDescriptor::new(Metric::GridFrequency, HERTZ), 50),
    (SensorDescriptor::new(Metric::EpsVoltage, VOLT), 53),
    (SensorDescriptor::new(Metric::EpsCurrent, AMPERE), 54),
    (SensorDescriptor::new(Metric::EpsPower, WATT), 55),
    (SensorDescriptor::new(Metric::EpsFrequency, HERTZ), 56),
];
