//! `solax sensors`: list what an endpoint kind exposes, without polling.

use solax_core::SensorDescriptor;
use solax_core::model::{BATTERY_SENSORS, INVERTER_SENSORS, REALTIME_SENSORS};

use crate::cli::{GlobalOpts, KindArg, SensorsArgs};
use crate::output;

pub fn descriptors(kind: KindArg) -> Vec<SensorDescriptor> {
    match kind {
        KindArg::Battery => BATTERY_SENSORS.to_vec(),
        KindArg::Inverter => INVERTER_SENSORS.to_vec(),
        KindArg::Local => REALTIME_SENSORS.iter().map(|(d, _)| *d).collect(),
    }
}

pub fn handle(args: &SensorsArgs, global: &GlobalOpts) {
    let out = output::render_descriptors(&global.output, &descriptors(args.kind));
    output::print_output(&out, global.quiet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_counts_per_kind() {
        assert_eq!(descriptors(KindArg::Battery).len(), 5);
        assert_eq!(descriptors(KindArg::Inverter).len(), 20);
        assert_eq!(descriptors(KindArg::Local).len(), 24);
    }
}
