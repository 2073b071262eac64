//! `solax fetch`: one startup poll per site, then print every sensor.

use solax_core::setup_site;
use tracing::debug;

use crate::cli::{FetchArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::site_readings;

pub async fn handle(args: FetchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let defaults = config::effective_defaults(global, &cfg);
    let sites = config::resolve_sites(
        global,
        &cfg,
        &args.target,
        args.token.as_deref(),
        args.all,
    )?;
    let client = config::client(&defaults)?;

    let mut readings = Vec::new();
    for site in sites {
        debug!(site = %site.name, endpoint = %site.target, "fetching");
        let handle = setup_site(&client, site).await?;
        readings.extend(site_readings(&handle));
        handle.shutdown().await;
    }

    let out = output::render_readings(
        &global.output,
        output::should_color(&global.color),
        &readings,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
