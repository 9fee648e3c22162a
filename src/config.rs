use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use log::warn;
use tokio_postgres::NoTls;

use crate::AppState;
use crate::repositories::{MemoryStore, PgPostStore, PgUserStore};

pub fn get_pg_pool() -> Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(env::var("PG_HOST").context("PG_HOST not set")?);
    cfg.user = Some(env::var("PG_USER").context("PG_USER not set")?);
    cfg.password = env::var("PG_PASS").ok();
    cfg.dbname = Some(env::var("PG_DB").context("PG_DB not set")?);

    if cfg.pool.is_none() {
        cfg.pool = Some(PoolConfig::default());
    }
    if let Some(ref mut pcfg) = cfg.pool {
        pcfg.max_size = 16;
    }

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .context("failed to create postgres pool")
}

/// Builds the shared state: Postgres-backed stores when `PG_HOST` is set,
/// otherwise the in-memory store so the demo runs without a database.
pub fn build_state() -> Result<AppState> {
    if env::var("PG_HOST").is_ok() {
        let pool = get_pg_pool()?;
        Ok(AppState {
            users: Arc::new(PgUserStore::new(pool.clone())),
            posts: Arc::new(PgPostStore::new(pool)),
        })
    } else {
        warn!("PG_HOST not set; using the in-memory store");
        let store = Arc::new(MemoryStore::default());
        Ok(AppState {
            users: store.clone(),
            posts: store,
        })
    }
}
