//! Serve a directory tree over the Gopher protocol, with caching.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use burrow::cache::contents::content_factory;
use burrow::cache::fcache::FileCache;
use burrow::cache::monitor::spawn_monitor;
use burrow::policy;
use burrow::settings::Settings;

mod app_config;
mod server;
mod trc;

use crate::app_config::Config;

#[derive(Parser)]
#[command(version, about = "A concurrent, caching Gopher protocol server.")]
struct Args {
    #[arg(short, long, value_parser, help = "Optional path to a burrow config TOML.")]
    config_path: Option<PathBuf>,

    /// Override the configured server root.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Override the configured port.
    #[arg(long)]
    port: Option<u16>,
}

/// Main entry point for the application.
#[expect(
    clippy::exit,
    reason = "top-level helper that intentionally terminates the process"
)]
fn main() {
    let args = Args::parse();

    // Config loads before tracing is up, so failures report via eprintln.
    let mut config = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::process::exit(1);
    });
    if let Some(root) = args.root {
        config.root = root;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Err(error_messages) = config.validate() {
        eprintln!("Configuration is invalid.");
        for msg in &error_messages {
            eprintln!(" - {msg}");
        }
        std::process::exit(1);
    }

    if let Err(e) = trc::init() {
        eprintln!(
            "Failed to initialize logging. Without logging, we can't provide any useful error \
             messages, so we have to exit: {e}"
        );
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build the async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(config.into_settings())) {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}

/// Bootstrap the cache and policy files, start the freshness monitor, and
/// serve until ctrl-c.
async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Arc::new(settings);
    let cache = Arc::new(FileCache::new(
        settings.cache_capacity,
        content_factory(Arc::clone(&settings)),
    ));

    // Single-threaded so far; the generated entries are in place before the
    // listener or the monitor can observe the cache.
    policy::install_policy_files(&cache, &settings).await?;
    let monitor = spawn_monitor(Arc::clone(&cache), settings.monitor_interval);

    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    info!(
        hostname = %settings.hostname,
        port = settings.port,
        root = %settings.root.display(),
        "listening"
    );

    tokio::select! {
        res = server::serve(listener, cache, Arc::clone(&settings)) => res?,
        _ = tokio::signal::ctrl_c() => info!("Received ctrl-c, shutting down."),
    }

    monitor.abort();
    Ok(())
}
