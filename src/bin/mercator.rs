//! CLI entrypoint for the Mercator confluence scanner.

use anyhow::{Context, Result};
use axum::{response::IntoResponse, routing::get, Router};
use clap::{Parser, Subcommand};
use mercator::config::Config;
use mercator::scan::TriggerKind;
use mercator::service::Service;
use std::{net::SocketAddr, net::TcpListener, path::PathBuf};

#[derive(Debug, Parser)]
#[command(name = "mercator", author, version, about = "Mercator confluence scanner", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Command to execute (defaults to `run`)
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the scheduler, welcome responder and health endpoints
    Run,
    /// Run one scan cycle now and print the confluence score
    ScanOnce,
    /// Send a test message to the configured chat
    TestAlert {
        /// Message text
        #[arg(long, default_value = "Mercator test alert")]
        message: String,
    },
    /// Write a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", Config::default_toml());
        return Ok(());
    }

    if let Some(Command::Init { config, force }) = &args.command {
        let path = PathBuf::from(config);
        if path.exists() && !force {
            anyhow::bail!("{} already exists. Use --force to overwrite.", path.display());
        }
        Config::default().save(&path).context("Failed to write default config")?;
        println!("✅ Wrote default config to {}", path.display());
        return Ok(());
    }

    // Logging comes up before the config so loading can report fallbacks.
    mercator::utils::init_logging(if args.debug { "debug" } else { "info" });
    let config = Config::load(&args.config).context("Failed to load configuration")?;
    if !args.debug {
        mercator::utils::set_log_level(&config.service.log_level);
    }
    if let Err(e) = mercator::metrics::init() {
        log::warn!("Metrics recorder not installed: {}", e);
    }

    let service = Service::from_config(&config).context("Invalid configuration")?;

    match args.command.unwrap_or(Command::Run) {
        | Command::ScanOnce => {
            let outcome = service.cycle().run(TriggerKind::Manual).await;
            println!("{}", outcome.message);
            println!("confluence={} delivered={}", outcome.confluence(), outcome.delivered);
        }
        | Command::TestAlert { message } => {
            let delivered = service.cycle().dispatch(&message).await;
            println!("delivered={}", delivered);
            if !delivered {
                anyhow::bail!("test alert was not delivered");
            }
        }
        | Command::Run => run_service(&config, service).await?,
        | Command::Init { .. } => {}
    }
    Ok(())
}

async fn health() -> impl IntoResponse {
    "OK"
}

async fn metrics_handler() -> impl IntoResponse {
    mercator::metrics::render()
}

async fn run_service(config: &Config, service: Service) -> Result<()> {
    log::info!("🚀 Mercator starting (dry_run={})", config.service.dry_run);
    let tasks = service.spawn();

    let app = Router::new()
        .route("/", get(|| async { "Mercator running" }))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_handler));
    let primary_addr: SocketAddr =
        config.service.http_addr.parse().context("service.http_addr is not a socket address")?;
    let listener = match TcpListener::bind(primary_addr) {
        | Ok(l) => l,
        | Err(e) => {
            log::warn!("{} unavailable: {} – binding to random port", primary_addr, e);
            TcpListener::bind("127.0.0.1:0").context("failed to bind random port")?
        }
    };
    let addr = listener.local_addr()?;
    log::info!("Serving /healthz and /metrics on http://{}", addr);

    let server = axum::Server::from_tcp(listener)
        .context("failed to create server from listener")?
        .serve(app.into_make_service());
    let server_handle = tokio::spawn(server);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown signal received. Stopping...");
    server_handle.abort();
    for task in tasks {
        task.abort();
    }

    Ok(())
}
