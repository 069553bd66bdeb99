use std::path::PathBuf;
use std::time::Duration;

use crate::mountinfo::DEFAULT_MOUNTINFO_PATH;

/// Command line configuration of the exporter.
#[derive(Debug, Clone, clap::Parser)]
#[command(
    name = "volume-stat",
    version,
    about = "Exports size, entry counts and block usage of a volume as Prometheus metrics"
)]
pub struct Config {
    /// Directory to scan.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "VOLUME_STAT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "VOLUME_STAT_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds between two scans.
    #[arg(
        long,
        env = "VOLUME_STAT_INTERVAL",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Mount table used to resolve the volume's host mount and device.
    #[arg(long, env = "VOLUME_STAT_MOUNTINFO", default_value = DEFAULT_MOUNTINFO_PATH)]
    pub mountinfo: PathBuf,
}

impl Config {
    /// Socket address string for the metrics endpoint.
    ///
    /// An empty host means all interfaces; IPv6 literals are bracketed.
    pub fn listen_addr(&self) -> String {
        let host = self.host.trim();
        if host.is_empty() {
            format!("0.0.0.0:{}", self.port)
        } else if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
