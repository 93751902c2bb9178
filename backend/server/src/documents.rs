//! Document metadata. The files themselves live elsewhere; only title, url and
//! owner are tracked here. Title and url are both required on create.
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    error::AppError::{self, MalformedPayload},
    models::{CreateDocument, Document, UpdateDocument},
};

const COLUMNS: &str = "id, document_title, document_url, user_id, created_at, updated_at";

fn require_non_empty(field: &str, value: Option<&str>) -> Result<(), AppError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(MalformedPayload(format!("{field} should not be empty"))),
        _ => Ok(()),
    }
}

pub async fn create(pool: &SqlitePool, document: CreateDocument) -> Result<Document, AppError> {
    require_non_empty("documentTitle", Some(document.document_title.as_str()))?;
    require_non_empty("documentUrl", Some(document.document_url.as_deref().unwrap_or_default()))?;

    let now = Utc::now();

    let record = sqlx::query_as::<_, Document>(&format!(
        "INSERT INTO documents ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(document.document_title)
    .bind(document.document_url)
    .bind(document.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Document>, AppError> {
    let records = sqlx::query_as::<_, Document>(&format!("SELECT {COLUMNS} FROM documents"))
        .fetch_all(pool)
        .await?;

    Ok(records)
}

pub async fn find_one(pool: &SqlitePool, id: &str) -> Result<Document, AppError> {
    sqlx::query_as::<_, Document>(&format!("SELECT {COLUMNS} FROM documents WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
}

/// Fields left out of `changes` keep their stored value.
pub async fn update(pool: &SqlitePool, id: &str, changes: UpdateDocument) -> Result<Document, AppError> {
    require_non_empty("documentTitle", changes.document_title.as_deref())?;
    require_non_empty("documentUrl", changes.document_url.as_deref())?;

    let record = sqlx::query_as::<_, Document>(&format!(
        "UPDATE documents SET \
            document_title = COALESCE(?, document_title), \
            document_url = COALESCE(?, document_url), \
            updated_at = ? \
         WHERE id = ? RETURNING {COLUMNS}"
    ))
    .bind(changes.document_title)
    .bind(changes.document_url)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

pub async fn remove(pool: &SqlitePool, id: &str) -> Result<Document, AppError> {
    let record = sqlx::query_as::<_, Document>(&format!("DELETE FROM documents WHERE id = ? RETURNING {COLUMNS}"))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(record)
}
