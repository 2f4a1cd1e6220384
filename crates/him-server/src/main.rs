//! # HIM Server
//!
//! Main binary: loads settings, prepares the database and upload directory,
//! then serves the REST API until interrupted.

use clap::Parser;
use him_api::{auth::generate_access_token, build_router, AppState};
use him_common::config::Settings;
use him_db::{repository::members, Database};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "him", version, about = "Church management API server")]
struct Cli {
    /// Override the HOST setting
    #[arg(long)]
    host: Option<String>,

    /// Override the PORT setting
    #[arg(long)]
    port: Option<u16>,

    /// Do not run pending migrations at startup
    #[arg(long)]
    skip_migrations: bool,

    /// Print an access token for this member and exit
    #[arg(long, value_name = "MEMBER_ID")]
    issue_token: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (structured logging) before anything logs
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(false))
        .with_target(true)
        .with_thread_ids(true)
        .with_filter_reloading();
    let filter_handle = builder.reload_handle();
    builder.init();

    // Load configuration
    let mut settings = Settings::from_env()?;
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if settings.debug {
        filter_handle.reload(log_filter(true))?;
    }

    if let Some(member_id) = cli.issue_token {
        return issue_token(&settings, member_id).await;
    }

    tracing::info!(
        environment = %settings.environment,
        "Starting {} v{}",
        settings.app_name,
        env!("CARGO_PKG_VERSION")
    );

    // Connect to the database
    let db = Database::connect(&settings).await?;
    if cli.skip_migrations {
        tracing::warn!("Skipping migrations");
    } else {
        db.migrate().await?;
    }

    let addr = SocketAddr::new(settings.host.parse()?, settings.port);
    let state = AppState::new(db.clone(), settings);
    state.storage.ensure_root().await?;
    tracing::info!(dir = %state.storage.root().display(), "Upload directory ready");

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    db.close().await;
    Ok(())
}

fn log_filter(debug: bool) -> EnvFilter {
    let default_filter = if debug {
        "him=debug,tower_http=debug,sqlx=debug"
    } else {
        "him=debug,tower_http=debug"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}

/// Bootstrap path for a fresh deployment: a token for an existing member,
/// who can then link provider identities through the API.
async fn issue_token(settings: &Settings, member_id: Uuid) -> anyhow::Result<()> {
    let db = Database::connect(settings).await?;
    let exists = db
        .unit_of_work(move |s| Box::pin(async move { Ok(members::find_by_id(s, member_id).await?) }))
        .await?
        .is_some();
    db.close().await;
    if !exists {
        anyhow::bail!("Member {member_id} not found");
    }

    let token = generate_access_token(
        member_id,
        &settings.secret_key,
        settings.access_token_ttl_secs(),
    )?;
    tracing::info!(%member_id, "Access token issued from the command line");
    println!("{token}");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
