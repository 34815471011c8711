// src/handlers/xml_upload.rs

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::multipart::read_uploaded_file,
    config::AppState,
    models::imports::{UploadResponse, UploadStatus},
};

// =============================================================================
//  STATUS (gate de ordem)
// =============================================================================

// GET /api/admin/upload/status
#[utoipa::path(
    get,
    path = "/api/admin/upload/status",
    tag = "XML Upload",
    responses(
        (status = 200, description = "Estado dos três estágios", body = UploadStatus)
    )
)]
pub async fn status(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let status = app_state.xml_upload_service.upload_status(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(status)))
}

// =============================================================================
//  ESTÁGIOS (clientes -> notas -> recibos)
// =============================================================================

// POST /api/admin/upload/customers
#[utoipa::path(
    post,
    path = "/api/admin/upload/customers",
    tag = "XML Upload",
    responses(
        (status = 200, description = "Resumo do estágio de clientes", body = UploadResponse),
        (status = 409, description = "Arquivo já enviado")
    )
)]
pub async fn upload_customers(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, bytes) = read_uploaded_file(multipart).await?;
    let response = app_state
        .xml_upload_service
        .upload_customers(&app_state.db_pool, &file_name, &bytes)
        .await?;
    Ok((StatusCode::OK, Json(response)))
}

// POST /api/admin/upload/bills
#[utoipa::path(
    post,
    path = "/api/admin/upload/bills",
    tag = "XML Upload",
    responses(
        (status = 200, description = "Resumo do estágio de notas", body = UploadResponse),
        (status = 400, description = "Violação de ordem: clientes primeiro"),
        (status = 409, description = "Arquivo já enviado")
    )
)]
pub async fn upload_bills(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, bytes) = read_uploaded_file(multipart).await?;
    let response = app_state
        .xml_upload_service
        .upload_bills(&app_state.db_pool, &file_name, &bytes)
        .await?;
    Ok((StatusCode::OK, Json(response)))
}

// POST /api/admin/upload/payments
#[utoipa::path(
    post,
    path = "/api/admin/upload/payments",
    tag = "XML Upload",
    responses(
        (status = 200, description = "Resumo do estágio de recibos", body = UploadResponse),
        (status = 400, description = "Violação de ordem: notas primeiro"),
        (status = 409, description = "Arquivo já enviado")
    )
)]
pub async fn upload_payments(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, bytes) = read_uploaded_file(multipart).await?;
    let response = app_state
        .xml_upload_service
        .upload_payments(&app_state.db_pool, &file_name, &bytes)
        .await?;
    Ok((StatusCode::OK, Json(response)))
}

// =============================================================================
//  RELATÓRIO DE ERROS
// =============================================================================

// GET /api/admin/upload/{upload_log_id}/errors
#[utoipa::path(
    get,
    path = "/api/admin/upload/{upload_log_id}/errors",
    tag = "XML Upload",
    params(("upload_log_id" = Uuid, Path, description = "ID do upload log")),
    responses(
        (status = 200, description = "CSV completo dos erros (Row,Field,Reason)"),
        (status = 404, description = "Log não encontrado ou sem erros")
    )
)]
pub async fn error_report(
    State(app_state): State<AppState>,
    Path(upload_log_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, csv) = app_state
        .xml_upload_service
        .error_report_csv(&app_state.db_pool, upload_log_id)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        csv,
    ))
}
