//! Fleetbook Server
//!
//! HTTP JSON API for the server inventory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use fleetbook_core::config::{self, Config};
use fleetbook_core::tracing_init::{DEFAULT_FILTER, init_tracing};

use fleetbook_server::auth::JwtManager;
use fleetbook_server::seed::seed_sample_data;
use fleetbook_server::server::{AppState, build_router};
use fleetbook_server::storage::InventoryDatabase;

#[derive(Parser, Debug)]
#[command(name = "fleetbook-server")]
#[command(version, about = "Fleetbook inventory server - servers, fields, metrics, audit")]
struct Args {
    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Explicit JSON config file, layered over the global one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JWT signing secret.
    #[arg(long, env = "FLEETBOOK_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Access token TTL in seconds.
    #[arg(long)]
    token_ttl: Option<i64>,

    /// Validate attribute bags against the field catalog on write.
    #[arg(long)]
    enforce_attribute_schema: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,

    /// Load the sample catalog, servers, and metrics before serving.
    #[arg(long)]
    seed: bool,
}

impl Args {
    /// CLI flags override every other configuration layer.
    fn apply(&self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(path) = &self.db_path {
            config.server.database_path = Some(path.clone());
        }
        if let Some(secret) = &self.jwt_secret {
            config.auth.jwt_secret = Some(secret.clone());
        }
        if let Some(ttl) = self.token_ttl {
            config.auth.token_ttl_secs = ttl;
        }
        if self.enforce_attribute_schema {
            config.registry.enforce_attribute_schema = true;
        }
        if self.log_json {
            config.server.log_json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref())?;
    args.apply(&mut config);

    init_tracing(DEFAULT_FILTER, config.server.log_json)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        enforce_attribute_schema = config.registry.enforce_attribute_schema,
        "Starting fleetbook-server"
    );

    let db_path = match &config.server.database_path {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening inventory database");
    let db = InventoryDatabase::open(&db_path).await?;

    if args.seed {
        seed_sample_data(&db).await?;
    }

    let secret = config.auth.jwt_secret.clone().unwrap_or_else(|| {
        warn!("No JWT secret configured; generated an ephemeral one, tokens will not survive a restart");
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    });
    let jwt = Arc::new(JwtManager::new(secret.as_bytes(), config.auth.token_ttl_secs));

    let addr = config.server.addr;
    let app = build_router(AppState {
        db,
        jwt,
        registry: Arc::new(config.registry),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".fleetbook").join("fleetbook.db"))
}
