//! # him-db
//!
//! Database layer for Project HIM. One `sqlx::AnyPool` serves MySQL or
//! PostgreSQL in production (SQLite in tests); every unit of work runs inside
//! a [`session::Session`].

pub mod any_compat;
pub mod repository;
pub mod session;
pub mod storage;

use anyhow::Result;
use him_common::config::Settings;
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions};
use std::str::FromStr;

pub use session::Session;

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
}

impl Database {
    /// Connect using the configured dialect and credentials.
    ///
    /// Statement logging is only enabled when `DEBUG` is set.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let url = settings.database_url()?;
        let mut options = AnyConnectOptions::from_str(&url)?;
        if !settings.debug {
            options = options.disable_statement_logging();
        }

        tracing::info!(
            db_type = %settings.db_type,
            host = %settings.db_host,
            name = %settings.db_name,
            "Connecting to database..."
        );
        let pool = AnyPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .connect_with(options)
            .await?;
        tracing::info!("Connected to database");

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Verify the database is reachable.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
