//! # SQLite
//!
//! Durable store for ingestion status rows and document metadata.
//!
//! ## Tables
//!
//! - `ingestions`: one row per successful trigger, keyed by `id` with a unique `process_id`
//! - `documents`: document metadata, keyed by `id`
//!
//! Both are created on startup if missing. There are no migrations beyond that.
//!
//! ## Notes
//!
//! - File databases run in WAL mode so readers do not block the single writer
//! - `sqlite::memory:` is pinned to one long-lived connection, otherwise every
//!   pooled connection would see its own empty database
use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::info;

pub async fn init_database(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?;
    let in_memory = is_memory(database_url);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
    };

    let pool = pool_options.connect_with(options).await?;

    if !in_memory {
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
    }

    create_tables(&pool).await?;
    info!("Connected to {database_url}");

    Ok(pool)
}

fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS ingestions (
            id TEXT PRIMARY KEY NOT NULL,
            process_id TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY NOT NULL,
            document_title TEXT NOT NULL,
            document_url TEXT,
            user_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
