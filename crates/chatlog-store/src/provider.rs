//! Connection providers.
//!
//! The logger and the history reader never open databases themselves; they
//! ask a [`ConnectionProvider`] for a ready connection. [`SqliteProvider`]
//! opens the pool on first use and brings the schema up to date before any
//! connection is handed out.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chatlog_settings::{ChatlogSettings, DatabaseSettings};
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool, IN_MEMORY_PATH, PooledConnection};
use crate::sqlite::migrations::run_migrations;

/// How long the process lingers after a fatal setup failure, so the
/// diagnostic reaches its sink before exit.
const EXIT_GRACE: Duration = Duration::from_millis(400);

/// Supplies established, migrated connections.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Check out a connection.
    async fn connection(&self) -> Result<PooledConnection>;
}

/// Check a connection out of a pool on the blocking thread pool.
async fn checkout(pool: ConnectionPool) -> Result<PooledConnection> {
    Ok(tokio::task::spawn_blocking(move || pool.get()).await??)
}

/// Provider over a pool the caller already prepared.
#[derive(Clone)]
pub struct PoolProvider {
    pool: ConnectionPool,
}

impl PoolProvider {
    /// Wrap an existing pool. The schema is assumed to be in place.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionProvider for PoolProvider {
    async fn connection(&self) -> Result<PooledConnection> {
        checkout(self.pool.clone()).await
    }
}

/// Lazily opened `SQLite` database described by [`DatabaseSettings`].
///
/// Concurrent first callers share one setup; later callers reuse the pool.
pub struct SqliteProvider {
    settings: DatabaseSettings,
    pool: OnceCell<ConnectionPool>,
}

impl SqliteProvider {
    /// Provider for the given database settings. Nothing is opened yet.
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            pool: OnceCell::new(),
        }
    }

    /// Provider for the `database` section of the full settings.
    pub fn from_settings(settings: &ChatlogSettings) -> Self {
        Self::new(settings.database.clone())
    }

    /// The database settings this provider opens.
    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    /// Open (once) and return the pool, surfacing setup failures.
    pub async fn try_pool(&self) -> Result<ConnectionPool> {
        self.pool
            .get_or_try_init(|| {
                let settings = self.settings.clone();
                async move {
                    let pool = tokio::task::spawn_blocking(move || open_database(&settings)).await??;
                    Ok::<_, StoreError>(pool)
                }
            })
            .await
            .cloned()
    }

    /// Check out a connection, surfacing setup failures instead of exiting.
    pub async fn try_connect(&self) -> Result<PooledConnection> {
        checkout(self.try_pool().await?).await
    }
}

#[async_trait]
impl ConnectionProvider for SqliteProvider {
    /// Check out a connection. A database that cannot be opened or migrated
    /// is fatal: the failure is logged and the process exits with status 1.
    async fn connection(&self) -> Result<PooledConnection> {
        let pool = match self.try_pool().await {
            Ok(pool) => pool,
            Err(e) => {
                error!(error = %e, path = %self.settings.path, "database setup failed");
                tokio::time::sleep(EXIT_GRACE).await;
                std::process::exit(1);
            }
        };
        checkout(pool).await
    }
}

fn open_database(settings: &DatabaseSettings) -> Result<ConnectionPool> {
    if settings.path != IN_MEMORY_PATH {
        if let Some(parent) = Path::new(&settings.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let pool = connection::open(&settings.path, &ConnectionConfig::from(settings))?;
    if settings.skip_migrations {
        debug!(path = %settings.path, "skipping migrations");
    } else {
        let conn = pool.get()?;
        let _ = run_migrations(&conn)?;
    }
    Ok(pool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
