//! finops-gateway entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finops_gateway::api::{create_router, AppState};
use finops_gateway::aws::AwsSession;
use finops_gateway::config::Config;
use finops_gateway::metrics;
use finops_gateway::utils::shutdown_signal;

/// HTTP facade over AWS billing, budgeting, and advisory APIs.
#[derive(Parser, Debug)]
#[command(name = "finops-gateway")]
#[command(about = "HTTP facade over AWS billing, budgeting, and advisory APIs")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port override.
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway (default).
    Run {
        /// HTTP server port override.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Resolve credentials and construct the session.
    CheckCredentials,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("finops_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckCredentials) => cmd_check_credentials().await,
        Some(Command::Run { port }) => cmd_run(port).await,
        None => cmd_run(args.port).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FINOPS GATEWAY - CONFIGURATION CHECK");
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
    println!("  Region: {}", config.aws_region);
    println!("  Access Key Parameter: {}", config.access_key_param);
    println!("  Secret Key Parameter: {}", config.secret_key_param);
    println!("  Advisor Language: {}", config.advisor_language);
    println!("  Port: {}", config.port);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("enabled on port {}", config.metrics_port)
        } else {
            "disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Resolve credentials and construct the session.
async fn cmd_check_credentials() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FINOPS GATEWAY - CREDENTIAL CHECK");
    println!("======================================================================");

    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    println!("Region: {}", config.aws_region);
    println!("Access Key Parameter: {}", config.access_key_param);
    println!("Secret Key Parameter: {}", config.secret_key_param);
    println!("======================================================================");

    print!("\nResolving credentials and building session... ");
    match AwsSession::bootstrap(&config).await {
        Ok(session) => {
            println!("OK");
            println!("  Region: {}", session.region());
            println!("  Handles: budgets, cost explorer, support, tagging");
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Credential bootstrap failed"));
        }
    }

    println!("\n======================================================================");
    println!("CREDENTIAL CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the gateway.
async fn cmd_run(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    metrics::init_metrics();
    if config.metrics_enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }

    // No partial-credential mode: bootstrap failure aborts startup.
    info!(region = %config.aws_region, "Bootstrapping session...");
    let session = AwsSession::bootstrap(&config).await.map_err(|e| {
        error!("Credential bootstrap failed: {}", e);
        anyhow::anyhow!("cannot start without credentials: {}", e)
    })?;
    info!("Session ready: budgets, cost explorer, support, tagging");

    let state = AppState::new(session, &config);
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
