//! `solax watch`: keep every site polling and print after each update.
//!
//! A site whose startup poll fails is retried on its scan interval.
//! Ctrl-C cancels all sites and shuts their coordinators down.

use std::time::Duration;

use solax_api::SolaxClient;
use solax_core::{CoreError, SiteConfig, SiteHandle, setup_site};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, SiteReading};

use super::site_readings;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let defaults = config::effective_defaults(global, &cfg);
    let mut sites = config::resolve_sites(
        global,
        &cfg,
        &args.target,
        args.token.as_deref(),
        args.all,
    )?;

    if let Some(interval) = args.interval {
        if interval == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        for site in &mut sites {
            site.scan_interval = Duration::from_secs(interval);
        }
    }
    if let Some(topology) = args.topology {
        for site in &mut sites {
            site.topology = topology.into();
        }
    }

    let client = config::client(&defaults)?;
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<Vec<SiteReading>>(16);

    let mut tasks = JoinSet::new();
    for site in sites {
        tasks.spawn(run_site(client.clone(), site, tx.clone(), cancel.clone()));
    }
    drop(tx);

    let color = output::should_color(&global.color);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, stopping sites");
                cancel.cancel();
                break;
            }
            update = rx.recv() => {
                let Some(readings) = update else { break };
                print_update(&global.output, color, global.quiet, &readings);
            }
        }
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}

fn print_update(format: &OutputFormat, color: bool, quiet: bool, readings: &[SiteReading]) {
    let out = output::render_readings(format, color, readings);
    output::print_output(&out, quiet);
}

/// Set the site up, retrying while it is not ready, then forward every
/// update until cancelled.
async fn run_site(
    client: SolaxClient,
    site: SiteConfig,
    tx: mpsc::Sender<Vec<SiteReading>>,
    cancel: CancellationToken,
) {
    let name = site.name.clone();
    let retry_after = site.scan_interval;

    let handle = loop {
        let setup = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            setup = setup_site(&client, site.clone()) => setup,
        };
        match setup {
            Ok(handle) => break handle,
            Err(e @ CoreError::NotReady { .. }) => {
                warn!(site = %name, error = %e, retry_in = ?retry_after, "site not ready");
            }
            Err(e) => {
                warn!(site = %name, error = %e, "site setup failed, giving up");
                return;
            }
        }
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(retry_after) => {}
        }
    };

    if tx.send(site_readings(&handle)).await.is_err() {
        handle.shutdown().await;
        return;
    }

    tokio::select! {
        () = cancel.cancelled() => {}
        () = forward_updates(&handle, &tx) => {}
    }
    handle.shutdown().await;
}

/// Send the site's readings after every poll of any of its coordinators.
async fn forward_updates(handle: &SiteHandle, tx: &mpsc::Sender<Vec<SiteReading>>) {
    let (changed_tx, mut changed_rx) = mpsc::channel::<()>(1);
    let mut watchers = JoinSet::new();
    for coordinator in handle.coordinators() {
        let mut receiver = coordinator.subscribe();
        let changed_tx = changed_tx.clone();
        watchers.spawn(async move {
            while receiver.changed().await.is_ok() {
                // A pending notification already covers this update.
                let _ = changed_tx.try_send(());
            }
        });
    }
    drop(changed_tx);

    while changed_rx.recv().await.is_some() {
        debug!(site = %handle.name(), "site updated");
        if tx.send(site_readings(handle)).await.is_err() {
            break;
        }
    }
    watchers.abort_all();
}
