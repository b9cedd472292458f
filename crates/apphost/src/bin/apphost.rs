//! Runs the app host HTTP server until Ctrl-C.
//!
//! Usage: `cargo run --bin apphost`

use std::path::Path;
use std::process::ExitCode;

use apphost::config::{load_or_create_host_config, resolve_config_dir};
use apphost::logging::init_logging;
use apphost::Server;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"));

    let config_dir = resolve_config_dir();
    let config = match load_or_create_host_config(&config_dir) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load host config from {}: {error}", config_dir.display());
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.server.log_filter.as_deref());

    let mut server = match Server::new(&config).await {
        Ok(server) => server,
        Err(error) => {
            eprintln!("failed to start server: {error}");
            return ExitCode::FAILURE;
        }
    };
    let addr = server.addr();

    println!("App host running at http://{addr}");
    println!("Host version: {}", config.host_version);
    println!("Config: {}", config_dir.display());
    println!();
    println!("Endpoints:");
    println!("  GET  http://{addr}/health");
    println!("  POST http://{addr}/manifest/validate");
    println!("  POST http://{addr}/manifest/fetch");
    println!("  GET  http://{addr}/manifest/schema");
    println!("  POST http://{addr}/apps/install");
    println!("  GET  http://{addr}/apps");
    println!();
    println!("Press Ctrl-C to stop.");

    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {error}");
    }
    tracing::info!("shutting down");
    let _ = server.shutdown();
    ExitCode::SUCCESS
}
