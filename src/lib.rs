//! Volume Stat: exports the size, entry counts and block usage of a mounted volume
//! as Prometheus metrics.
//!
//! This library resolves the mount backing a directory, periodically walks the
//! directory tree and reads the block statistics of its filesystem, and serves
//! the latest results over HTTP.

use std::sync::Arc;

use collector::Collector;
use config::Config;
use error::{Error, Result, ResultOkLogExt};
use tokio::signal::unix::{SignalKind, signal};

pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod mountinfo;
pub mod scan;
pub mod schedule;
pub mod snapshot;
pub mod usage;

/// Runs the exporter until SIGINT or SIGTERM is received.
///
/// Resolves the volume's mount once, binds the metrics endpoint, collects an
/// initial snapshot and then refreshes it every [`Config::interval`] while serving
/// requests.
///
/// # Errors
///
/// Possible errors include:
/// - Failure to bind the metrics endpoint.
/// - Failure to install the signal handlers.
/// - The server or the periodic update task failing.
pub async fn run(config: Config) -> Result<()> {
    let mount = mountinfo::resolve(&config.path, &config.mountinfo);
    if mount.is_unknown() {
        log::info!(
            "Volume {} is reported with `{}` host path and device",
            mount.target().display(),
            mountinfo::UNKNOWN
        );
    } else {
        log::info!(
            "Volume {} is mounted at {} from {} (host path {}, device {})",
            mount.target().display(),
            mount.mount_point(),
            mount.device(),
            mount.host_mount_path(),
            mount.major_minor()
        );
    }

    let (reporter, snapshots) = snapshot::Reporter::new(mount);
    let addr = config.listen_addr();
    let server = api::APIServer::bind(&addr, snapshots).await?;
    if let Some(local) = server.local_addr().ok_log() {
        log::info!("Listening on {}", local);
    }

    let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;
    let (trigger, shutdown) = schedule::shutdown_channel();
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    log::error!("failed to listen for SIGINT: {}", err);
                }
            }
            _ = terminate.recv() => {}
        }
        log::info!("Received shutdown signal");
        trigger.trigger();
    });

    let collector = Arc::new(Collector::new(reporter));
    collector.collect().await;

    let updater = {
        let collector = Arc::clone(&collector);
        tokio::spawn(schedule::run_periodic(
            config.interval(),
            shutdown.clone(),
            move || {
                let collector = Arc::clone(&collector);
                async move { collector.collect().await }
            },
        ))
    };

    server.serve(shutdown).await?;
    updater.await?;
    log::info!("Shutdown complete");
    Ok(())
}
