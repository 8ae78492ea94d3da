//! Storage executor and database handle.
//!
//! Every repository runs its statements against a borrowed [`DbConn`]. Both a pooled connection
//! ([`Database::acquire`]) and an open transaction ([`Database::begin`]) dereference to it, so the
//! same repository code runs in ambient mode or inside a unit of work:
//!
//! ```ignore
//! let mut conn = db.acquire().await?;
//! let taken = Accounts::new(&mut conn).exists_by_username("alice").await?;
//!
//! let mut tx = db.begin().await?;
//! let id = Accounts::new(&mut tx).create(&request).await?;
//! Credentials::new(&mut tx).create(&credential).await?;
//! tx.commit().await?;
//! ```
//!
//! Statement failures are returned as-is (after classification into [`DbError`]); nothing here
//! retries.

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{info, instrument};

use crate::config::DatabaseConfig;
use crate::db::errors::{DbError, Result};

/// The executor every repository is constructed over.
pub type DbConn = SqliteConnection;

/// Check that a mutation touched exactly `expected` rows.
pub fn expect_rows_affected(result: &SqliteQueryResult, expected: u64) -> Result<()> {
    let actual = result.rows_affected();
    if actual != expected {
        return Err(DbError::WriteCountMismatch { expected, actual });
    }
    Ok(())
}

/// Handle to the connection pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool described by `config`, creating the database file if needed.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let settings = &config.pool;
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
        if settings.idle_timeout_secs > 0 {
            pool_options = pool_options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
        }

        let pool = pool_options.connect_with(options).await?;
        info!(url = %config.url, max_connections = settings.max_connections, "Connected to database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the embedded migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> anyhow::Result<()> {
        crate::migrator().run(&self.pool).await?;
        Ok(())
    }

    /// Check out an ambient connection for read-only work.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Begin a write transaction. Dropping it without `commit` rolls back.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`). A deferred transaction that reads
    /// before writing cannot upgrade its lock while another writer is active, and SQLite fails
    /// that upgrade immediately instead of waiting for the busy timeout.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    #[test_log::test]
    async fn test_expect_rows_affected(pool: SqlitePool) {
        let db = Database::from_pool(pool);
        let mut conn = db.acquire().await.unwrap();

        let result = sqlx::query("UPDATE account_role SET name = name WHERE id = 1")
            .execute(&mut *conn)
            .await
            .unwrap();
        assert!(expect_rows_affected(&result, 1).is_ok());

        let result = sqlx::query("UPDATE account_role SET name = name WHERE id = 999")
            .execute(&mut *conn)
            .await
            .unwrap();
        assert!(matches!(
            expect_rows_affected(&result, 1),
            Err(DbError::WriteCountMismatch { expected: 1, actual: 0 })
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dropped_transaction_rolls_back(pool: SqlitePool) {
        let db = Database::from_pool(pool);

        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query("INSERT INTO account_role (id, name) VALUES (3, 'auditor')")
                .execute(&mut *tx)
                .await
                .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account_role")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
