//! VoltPark CLI server
//!
//! Headless parking and EV-charging booking service, suitable for a
//! systemd unit, a container, or a local demo.
//!
//! ```sh
//! # Default config (~/.config/voltpark/config.toml)
//! voltpark-service
//!
//! # Custom config path and port
//! voltpark-service --config /etc/voltpark/config.toml --port 9090
//!
//! # Try it without a database
//! voltpark-service --memory
//!
//! # Validate config without starting
//! voltpark-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use voltpark::config::AppConfig;
use voltpark::server::{init_tracing, ServerHandle, ServerOptions};

/// VoltPark: parking and EV-charging bookings with live slot availability.
#[derive(Parser, Debug)]
#[command(
    name = "voltpark-service",
    version,
    about = "Parking and EV-charging booking service",
    long_about = "VoltPark REST API + realtime WebSocket server for drivers, \
                  property owners and admins.\n\n\
                  Default config: ~/.config/voltpark/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "VOLTPARK_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip creating the default admin account.
    #[arg(long)]
    no_admin: bool,

    /// Run on the in-memory store; nothing is persisted.
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(voltpark::default_config_path);

    let loaded = AppConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => AppConfig::default(),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match loaded {
        Ok(_) => info!("Configuration loaded from {}", config_path.display()),
        Err(e) => {
            if cli.check {
                eprintln!("Invalid configuration in {}: {}", config_path.display(), e);
                std::process::exit(1);
            }
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    if let Some(port) = cli.port {
        info!("CLI override: api_port = {}", port);
        config.server.api_port = port;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Database    : {}", config.database.connection_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Policy      : {:?}", config.booking.transition_policy);
        println!("   Sweep       : every {}s", config.sync.interval_secs);
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        create_default_admin: !cli.no_admin,
        in_memory: cli.memory,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
