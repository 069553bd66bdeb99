use std::process::ExitCode;

use clap::Parser;

/// Entry point for the Volume Stat exporter.
///
/// Parses the command line, initializes logging and runs the exporter until it
/// receives SIGINT or SIGTERM.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug cargo run -- --port 9100 /data
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = volume_stat::config::Config::parse();

    match volume_stat::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
