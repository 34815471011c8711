// src/handlers/imports.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::multipart::read_uploaded_file,
    config::AppState,
    models::imports::{FileKind, ImportLog, SyncResponse},
};

// =============================================================================
//  UPLOAD (pipeline auto-detectável)
// =============================================================================

// POST /api/admin/import/upload
#[utoipa::path(
    post,
    path = "/api/admin/import/upload",
    tag = "Import",
    responses(
        (status = 200, description = "Arquivo aceito no staging"),
        (status = 400, description = "Arquivo vazio, ilegível ou de tipo não reconhecido"),
        (status = 409, description = "Arquivo já importado (hash duplicado)")
    )
)]
pub async fn upload(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, bytes) = read_uploaded_file(multipart).await?;

    let staging = app_state
        .import_service
        .accept_upload(&app_state.db_pool, &file_name, &bytes)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "importId": staging.id,
            "detectedType": staging.detected_type,
            "fileName": staging.file_name,
        })),
    ))
}

// POST /api/admin/import/{import_id}/sync
#[utoipa::path(
    post,
    path = "/api/admin/import/{import_id}/sync",
    tag = "Import",
    params(("import_id" = Uuid, Path, description = "ID do lote em staging")),
    responses(
        (status = 200, description = "Lote reconciliado", body = SyncResponse),
        (status = 400, description = "Lote já processado"),
        (status = 404, description = "Lote não encontrado")
    )
)]
pub async fn sync(
    State(app_state): State<AppState>,
    Path(import_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.import_service.sync(&app_state.db_pool, import_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

// =============================================================================
//  HISTÓRICO
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct ImportLogsParams {
    // Filtro opcional por tipo detectado.
    #[serde(rename = "type")]
    pub import_type: Option<FileKind>,

    pub limit: Option<i64>,
}

// GET /api/admin/import/logs
#[utoipa::path(
    get,
    path = "/api/admin/import/logs",
    tag = "Import",
    params(ImportLogsParams),
    responses(
        (status = 200, description = "Histórico de importações", body = Vec<ImportLog>)
    )
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    Query(params): Query<ImportLogsParams>,
) -> Result<impl IntoResponse, AppError> {
    let logs = app_state
        .import_service
        .list_logs(
            &app_state.db_pool,
            params.import_type,
            params.limit.unwrap_or(20).clamp(1, 100),
        )
        .await?;

    Ok((StatusCode::OK, Json(logs)))
}
