// ── Domain model ──
//
// Metric names, per-endpoint sensor tables, and the snapshot a poll yields.

pub mod descriptor;
pub mod metric;
pub mod snapshot;

pub use descriptor::{
    BATTERY_KEYS, BATTERY_SENSORS, INVERTER_SENSORS, REALTIME_SENSORS, SensorDescriptor,
    inverter_sensor,
};
pub use metric::Metric;
pub use snapshot::MetricSnapshot;
