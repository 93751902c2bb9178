//! # Ingestion Lifecycle
//!
//! Starting a run is two independent steps: ask the backend to start, then
//! record the returned process id as `InProgress`. There is no transaction
//! across them, so a crash in between leaves the run untracked. A failed
//! insert is reported like a failed backend call, as a gateway error.
//!
//! Status is never written here after creation. Records leave only through
//! an explicit delete.
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{IN_PROGRESS, Ingestion},
    upstream::IngestionBackend,
};

const COLUMNS: &str = "id, process_id, status, payload, created_at, updated_at";

pub async fn trigger(
    pool: &SqlitePool,
    backend: &dyn IngestionBackend,
    message: &str,
) -> Result<String, AppError> {
    let ack = backend.start_ingestion(message).await.map_err(|e| {
        error!("Failed to trigger ingestion: {e:?}");
        AppError::UpstreamFailure(e.cause())
    })?;

    match ack.process_id() {
        Some(process_id) => {
            insert(pool, &process_id, message).await.map_err(|e| {
                error!("Failed to record ingestion {process_id}: {e}");
                AppError::UpstreamFailure(e.to_string())
            })?;
        }
        None => warn!("Ingestion backend returned no pid, run will not be tracked"),
    }

    let confirmation = format!("Ingestion started: {}", ack.message_text());
    info!("{confirmation}");

    Ok(confirmation)
}

async fn insert(pool: &SqlitePool, process_id: &str, payload: &str) -> Result<Ingestion, sqlx::Error> {
    let now = Utc::now();

    let record = sqlx::query_as::<_, Ingestion>(&format!(
        "INSERT INTO ingestions ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(process_id)
    .bind(IN_PROGRESS)
    .bind(payload)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

pub async fn get_status(pool: &SqlitePool, process_id: &str) -> Result<String, AppError> {
    let status: Option<(String,)> = sqlx::query_as("SELECT status FROM ingestions WHERE process_id = ?")
        .bind(process_id)
        .fetch_optional(pool)
        .await?;

    status
        .map(|(status,)| status)
        .ok_or_else(|| AppError::NotFound("Process not found".to_string()))
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Ingestion>, AppError> {
    let records = sqlx::query_as::<_, Ingestion>(&format!("SELECT {COLUMNS} FROM ingestions"))
        .fetch_all(pool)
        .await?;

    Ok(records)
}

/// Absent ids surface as the driver's `RowNotFound`, not as a 404.
pub async fn remove(pool: &SqlitePool, id: &str) -> Result<Ingestion, AppError> {
    let record = sqlx::query_as::<_, Ingestion>(&format!("DELETE FROM ingestions WHERE id = ? RETURNING {COLUMNS}"))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(record)
}
