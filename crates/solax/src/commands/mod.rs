//! Command dispatch: bridges CLI args -> core site setup -> output formatting.

pub mod config_cmd;
pub mod fetch;
pub mod sensors;
pub mod watch;

use solax_core::SiteHandle;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output::SiteReading;

/// Dispatch a polling command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Fetch(args) => fetch::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        Command::Sensors(args) => {
            sensors::handle(&args, global);
            Ok(())
        }
        Command::Config(args) => config_cmd::handle(args, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}

/// Current reading of every sensor of a running site.
pub fn site_readings(handle: &SiteHandle) -> Vec<SiteReading> {
    handle
        .sensors()
        .iter()
        .map(|sensor| SiteReading {
            site: handle.name().to_owned(),
            reading: sensor.reading(),
        })
        .collect()
}
