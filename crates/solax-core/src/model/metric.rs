// ── Metric domain types ──

use serde::{Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every telemetry value any SolaX endpoint can report.
///
/// The `strum` name is the vendor's human-readable label, which doubles as
/// the sensor name shown to the host and the key the inverter allow-list is
/// matched against.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[non_exhaustive]
pub enum Metric {
    // Battery list
    #[strum(serialize = "Voltage")]
    Voltage,
    #[strum(serialize = "Current")]
    Current,
    #[strum(serialize = "Power")]
    Power,
    #[strum(serialize = "Temperature")]
    Temperature,
    #[strum(serialize = "Remaining Capacity")]
    RemainingCapacity,

    // Inverter list / real-time
    #[strum(serialize = "PV1 Current")]
    Pv1Current,
    #[strum(serialize = "PV2 Current")]
    Pv2Current,
    #[strum(serialize = "PV1 Voltage")]
    Pv1Voltage,
    #[strum(serialize = "PV2 Voltage")]
    Pv2Voltage,
    #[strum(serialize = "PV1 Input Power")]
    Pv1InputPower,
    #[strum(serialize = "PV2 Input Power")]
    Pv2InputPower,
    #[strum(serialize = "Output Current")]
    OutputCurrent,
    #[strum(serialize = "Network Voltage")]
    NetworkVoltage,
    #[strum(serialize = "Power Now")]
    PowerNow,
    #[strum(serialize = "Exported Power")]
    ExportedPower,
    #[strum(serialize = "Exported energy")]
    ExportedEnergy,
    #[strum(serialize = "Grid Consumption")]
    GridConsumption,
    #[strum(serialize = "FAC1")]
    AcFrequency,
    #[strum(serialize = "Today's Energy")]
    TodayEnergy,
    #[strum(serialize = "Total Energy")]
    TotalEnergy,
    #[strum(serialize = "EPS Voltage")]
    EpsVoltage,
    #[strum(serialize = "EPS Current")]
    EpsCurrent,
    #[strum(serialize = "EPS Power")]
    EpsPower,
    #[strum(serialize = "EPS Frequency")]
    EpsFrequency,
    #[strum(serialize = "BMS Lost")]
    BmsLost,

    // Real-time only
    #[strum(serialize = "Inverter Temperature")]
    InverterTemperature,
    #[strum(serialize = "PV1 Power")]
    Pv1Power,
    #[strum(serialize = "PV2 Power")]
    Pv2Power,
    #[strum(serialize = "Battery Voltage")]
    BatteryVoltage,
    #[strum(serialize = "Battery Current")]
    BatteryCurrent,
    #[strum(serialize = "Battery Power")]
    BatteryPower,
    #[strum(serialize = "Battery Temperature")]
    BatteryTemperature,
    #[strum(serialize = "Battery Remaining Capacity")]
    BatteryRemainingCapacity,
    #[strum(serialize = "Battery Energy")]
    BatteryEnergy,
    #[strum(serialize = "Grid Frequency")]
    GridFrequency,
}

impl Metric {
    /// Vendor display name, e.g. `"PV1 Current"`.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
