use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ebloodbank_gateway::GatewayBuilder;
use ebloodbank_server::api::AppState;
use ebloodbank_server::auth::config::AuthFileConfig;
use ebloodbank_server::auth::{AuthProvider, api_key, mirror_directory, password};
use ebloodbank_server::config::EbloodbankConfig;

/// ebloodbank HTTP server.
#[derive(Parser, Debug)]
#[command(name = "ebloodbank-server", about = "Standalone HTTP server for ebloodbank")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ebloodbank.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the store tables for the configured backend, then exit.
    Migrate,
    /// Print the argon2 hash of a password read from stdin, for `auth.toml`.
    HashPassword,
    /// Print the SHA-256 hash of an API key read from stdin, for `auth.toml`.
    HashKey,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Some(Commands::HashPassword) => {
            println!("{}", password::hash_password(&read_stdin()?)?);
            return Ok(());
        }
        Some(Commands::HashKey) => {
            println!("{}", api_key::hash_api_key(&read_stdin()?));
            return Ok(());
        }
        Some(Commands::Migrate) | None => {}
    }

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: EbloodbankConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    let store = ebloodbank_server::store_factory::create_store(&config.store).await?;
    if let Some(Commands::Migrate) = cli.command {
        info!(backend = %config.store.backend, "store migrations complete");
        return Ok(());
    }

    let gateway = Arc::new(
        GatewayBuilder::new()
            .store(store)
            .max_cas_attempts(config.gateway.max_cas_attempts)
            .max_code_attempts(config.gateway.max_code_attempts)
            .build()?,
    );

    // Build the auth provider if enabled.
    let auth_provider = if config.auth.enabled {
        let auth_path = resolve_auth_path(&cli.config, config.auth.config_path.as_deref());
        let auth_contents = std::fs::read_to_string(&auth_path)
            .map_err(|e| format!("failed to read auth config at {}: {e}", auth_path.display()))?;
        let auth_config: AuthFileConfig = toml::from_str(&auth_contents)?;
        auth_config.validate()?;

        mirror_directory(&auth_config, &gateway).await?;
        let provider = AuthProvider::new(&auth_config, Arc::clone(&gateway))?;
        info!(path = %auth_path.display(), "authentication enabled");
        Some(Arc::new(provider))
    } else {
        warn!("authentication disabled; every caller is treated as an admin");
        None
    };

    let state = AppState {
        gateway,
        auth: auth_provider,
    };
    let app = ebloodbank_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "ebloodbank-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM, bounded by the
    // configured timeout once the signal arrives.
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });
    let drain_limit = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        () = drain_limit => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping in-flight requests"
            );
        }
    }

    info!("ebloodbank-server shut down");
    Ok(())
}

/// Resolve `auth.toml` relative to the directory of the main config file.
fn resolve_auth_path(config_path: &str, auth_path: Option<&str>) -> PathBuf {
    let auth_path = auth_path.unwrap_or("auth.toml");
    if Path::new(auth_path).is_relative() {
        Path::new(config_path)
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(auth_path)
    } else {
        PathBuf::from(auth_path)
    }
}

fn read_stdin() -> Result<String, std::io::Error> {
    let mut input = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_owned())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
