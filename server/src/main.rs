//! Signet license signing server
//!
//! Issues Ed25519-signed, machine-bound licenses and serves the key and
//! license administration API.
//!
//! Usage:
//!   signet-server --admin-token <TOKEN> --master-key <BASE64>
//!   signet-server --generate-master-key

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::Parser;
use signet_crypto::{KdfParams, MasterKey, Salt, derive_master_key, generate_master_key};
use signet_server::{AppState, build_router};
use signet_store::Database;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "signet-server")]
#[command(about = "Signet license signing server", version)]
struct Args {
    /// Address for the HTTP API
    #[arg(long, env = "SIGNET_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Path to the SQLite database
    #[arg(long, env = "SIGNET_DATABASE", default_value = "signet.db")]
    database: PathBuf,

    /// Master key as base64 (32 bytes)
    #[arg(long, env = "SIGNET_MASTER_KEY", hide_env_values = true, conflicts_with = "master_passphrase")]
    master_key: Option<String>,

    /// Passphrase to derive the master key from (Argon2id)
    #[arg(long, env = "SIGNET_MASTER_PASSPHRASE", hide_env_values = true, requires = "master_salt")]
    master_passphrase: Option<String>,

    /// Salt for passphrase derivation as base64 (16 bytes)
    #[arg(long, env = "SIGNET_MASTER_SALT")]
    master_salt: Option<String>,

    /// Bearer token required on administrative routes
    #[arg(long, env = "SIGNET_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Also write each issued license to this directory
    #[arg(long)]
    license_dir: Option<PathBuf>,

    /// Print a fresh master key and salt, then exit
    #[arg(long)]
    generate_master_key: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_master_key {
        let key = generate_master_key();
        println!("SIGNET_MASTER_KEY={}", STANDARD.encode(key.as_bytes()));
        println!("SIGNET_MASTER_SALT={}", Salt::random().to_base64());
        return Ok(());
    }

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Signet server starting...");

    let admin_token = match args.admin_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => bail!("an admin token is required (--admin-token or SIGNET_ADMIN_TOKEN)"),
    };
    let master_key = resolve_master_key(&args)?;

    let db = Database::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    info!("Database: {}", args.database.display());

    let mut state = AppState::new(db, Arc::new(master_key), admin_token);
    if let Some(dir) = &args.license_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create license directory {}", dir.display()))?;
        info!("Mirroring issued licenses to {}", dir.display());
        state = state.with_license_dir(dir.clone());
    }

    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("HTTP API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Signet server stopped");
    Ok(())
}

fn resolve_master_key(args: &Args) -> Result<MasterKey> {
    if let Some(encoded) = &args.master_key {
        return MasterKey::from_base64(encoded.trim()).context("Invalid master key");
    }

    if let Some(passphrase) = &args.master_passphrase {
        let salt = args
            .master_salt
            .as_deref()
            .context("--master-salt is required with a passphrase")?;
        let salt = Salt::from_base64(salt.trim()).context("Invalid master salt")?;
        info!("Deriving master key from passphrase");
        return derive_master_key(passphrase, &salt, &KdfParams::default()).context("Failed to derive master key");
    }

    bail!("a master key is required (--master-key or --master-passphrase with --master-salt)")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
