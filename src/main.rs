//! Asta marketplace server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use asta_server::api::{create_router, AppState};
use asta_server::auth::TokenService;
use asta_server::config::{Config, StoreBackend};
use asta_server::metrics;
use asta_server::payment::{MockPaymentGateway, PaymentGateway, StripeClient};
use asta_server::store::{MemoryStore, MongoStore, Store};
use asta_server::utils::{redact, shutdown_signal};

/// Event-services marketplace backend.
#[derive(Parser, Debug)]
#[command(name = "asta-server")]
#[command(about = "REST backend for booking caterers, hotels and photographers")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Run {
        /// Listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep collections in memory instead of MongoDB.
        #[arg(long)]
        memory: bool,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Connect to the configured store and ping it.
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("asta_server=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::Run { port, memory }) => cmd_run(port, memory).await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Ping) => cmd_ping().await,
        None => cmd_run(None, false).await,
    }
}

/// Load and validate configuration, applying CLI overrides.
fn load_config(port: Option<u16>, memory: bool) -> anyhow::Result<Config> {
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(port) = port {
        config.port = port;
    }
    if memory {
        config.store_backend = StoreBackend::Memory;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Build the configured store backend.
async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Mongo => {
            let uri = config.mongodb_uri()?;
            let store = MongoStore::connect(&uri, &config.db_name).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Build the payment gateway: Stripe when a key is configured.
fn payment_gateway(config: &Config) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    match &config.stripe_secret_key {
        Some(key) => Ok(Arc::new(StripeClient::new(config, key)?)),
        None => {
            warn!("STRIPE_SECRET_KEY not set; payment intents are simulated");
            Ok(Arc::new(MockPaymentGateway::new(config.payment_currency.clone())))
        }
    }
}

/// Serve the HTTP API.
async fn cmd_run(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config(port, memory)?;
    info!("Configuration loaded successfully");
    info!("Store backend: {}", config.store_backend);

    // Initialize metrics
    let metrics_handle = metrics::install_recorder()?;

    let store = connect_store(&config).await?;
    match store.ping().await {
        Ok(()) => info!("Pinged the store; connection is healthy"),
        Err(e) => warn!("Store ping failed, serving anyway: {}", e),
    }

    let tokens = TokenService::new(&config.access_token_secret, config.token_ttl_seconds);
    let state = AppState::new(store, payment_gateway(&config)?, tokens).with_metrics(metrics_handle);
    let router = create_router(state, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Asta is running on port {}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ASTA SERVER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Store Backend: {}", config.store_backend);
    if config.store_backend == StoreBackend::Mongo {
        println!(
            "  Connection: {}",
            if config.mongodb_uri.is_some() { "MONGODB_URI" } else { "DB_USER/DB_PASS/DB_HOST" }
        );
        if let Some(host) = &config.db_host {
            println!("  DB Host: {}", host);
        }
    }
    println!("  Database: {}", config.db_name);
    println!("  Token TTL: {}s", config.token_ttl_seconds);
    println!("  Token Secret: {}", redact(&config.access_token_secret));
    match &config.stripe_secret_key {
        Some(key) => println!("  Stripe Key: {}", redact(key)),
        None => println!("  Stripe Key: not set (payments simulated)"),
    }
    println!("  Currency: {}", config.payment_currency);
    println!("  CORS Origins: {}", config.cors_origins.join(", "));
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Connect to the configured store and ping it.
async fn cmd_ping() -> anyhow::Result<()> {
    let config = load_config(None, false)?;

    print!("Pinging {} store... ", config.store_backend);
    let store = connect_store(&config).await?;
    match store.ping().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            Err(anyhow::anyhow!("Store ping failed"))
        }
    }
}
