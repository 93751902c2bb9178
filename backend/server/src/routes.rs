use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State as Shared},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    documents,
    error::AppError,
    ingestion,
    models::{CreateDocument, Document, Ingestion, TriggerIngestion, UpdateDocument},
    state::State,
};

pub async fn trigger_handler(
    Shared(state): Shared<Arc<State>>,
    Json(payload): Json<TriggerIngestion>,
) -> Result<impl IntoResponse, AppError> {
    let confirmation = ingestion::trigger(&state.pool, state.backend.as_ref(), &payload.message).await?;

    Ok((StatusCode::CREATED, confirmation))
}

pub async fn status_handler(
    Shared(state): Shared<Arc<State>>,
    Path(process_id): Path<String>,
) -> Result<String, AppError> {
    let status = ingestion::get_status(&state.pool, &process_id).await?;

    if status.is_empty() {
        return Ok("Process not found".to_string());
    }

    Ok(format!("Status of process {process_id}: {status}"))
}

pub async fn list_ingestions_handler(Shared(state): Shared<Arc<State>>) -> Result<Json<Vec<Ingestion>>, AppError> {
    Ok(Json(ingestion::list_all(&state.pool).await?))
}

pub async fn remove_ingestion_handler(
    Shared(state): Shared<Arc<State>>,
    Path(id): Path<String>,
) -> Result<Json<Ingestion>, AppError> {
    Ok(Json(ingestion::remove(&state.pool, &id).await?))
}

pub async fn create_document_handler(
    Shared(state): Shared<Arc<State>>,
    Json(payload): Json<CreateDocument>,
) -> Result<impl IntoResponse, AppError> {
    let document = documents::create(&state.pool, payload).await?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn list_documents_handler(Shared(state): Shared<Arc<State>>) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(documents::find_all(&state.pool).await?))
}

pub async fn get_document_handler(
    Shared(state): Shared<Arc<State>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(documents::find_one(&state.pool, &id).await?))
}

pub async fn update_document_handler(
    Shared(state): Shared<Arc<State>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDocument>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(documents::update(&state.pool, &id, payload).await?))
}

pub async fn remove_document_handler(
    Shared(state): Shared<Arc<State>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(documents::remove(&state.pool, &id).await?))
}
