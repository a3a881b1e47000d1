// SPDX-License-Identifier: MIT
//! Default [`SessionFactory`] over a SQLite connection pool.
//!
//! The health check opens a session and round-trips `SELECT 1`; the recovery
//! handler calls [`SqliteSessionFactory::reconnect`] to tear the pool down
//! and rebuild it from the stored URL.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::info;

use crate::contracts::{DbSession, SessionFactory};

const MAX_CONNECTIONS: u32 = 4;

/// Session factory backed by a swappable `SqlitePool`.
pub struct SqliteSessionFactory {
    url: String,
    pool: RwLock<SqlitePool>,
}

impl SqliteSessionFactory {
    /// Connect to `url` (e.g. `sqlite:///var/lib/sched/sched.db?mode=rwc`).
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = Self::build_pool(url).await?;
        Ok(Self {
            url: url.to_string(),
            pool: RwLock::new(pool),
        })
    }

    async fn build_pool(url: &str) -> anyhow::Result<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        Ok(pool)
    }

    /// Clone of the current pool, for callers that need direct access.
    pub async fn pool(&self) -> SqlitePool {
        self.pool.read().await.clone()
    }
}

struct PooledSession {
    pool: SqlitePool,
}

#[async_trait]
impl DbSession for PooledSession {
    async fn execute(&mut self, sql: &str) -> anyhow::Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for SqliteSessionFactory {
    async fn session(&self) -> anyhow::Result<Box<dyn DbSession>> {
        Ok(Box::new(PooledSession {
            pool: self.pool.read().await.clone(),
        }))
    }

    async fn reconnect(&self) -> anyhow::Result<()> {
        let fresh = Self::build_pool(&self.url).await?;
        let stale = {
            let mut pool = self.pool.write().await;
            std::mem::replace(&mut *pool, fresh)
        };
        stale.close().await;
        info!("database connection pool recreated");
        Ok(())
    }
}
