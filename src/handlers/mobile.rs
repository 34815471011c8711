// src/handlers/mobile.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::customer::MobileLinkRequest};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequestPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "ABC School")]
    pub name: String,

    #[validate(length(equal = 10, message = "O celular deve ter 10 dígitos."))]
    #[schema(example = "9876543210")]
    pub mobile: String,
}

// POST /api/mobile/link-request
#[utoipa::path(
    post,
    path = "/api/mobile/link-request",
    tag = "Mobile",
    request_body = LinkRequestPayload,
    responses(
        (status = 201, description = "Solicitação registrada", body = MobileLinkRequest)
    )
)]
pub async fn request_link(
    State(app_state): State<AppState>,
    Json(payload): Json<LinkRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .mobile_service
        .request_link(&app_state.db_pool, &payload.name, &payload.mobile)
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

// POST /api/admin/mobile/{request_id}/approve
#[utoipa::path(
    post,
    path = "/api/admin/mobile/{request_id}/approve",
    tag = "Mobile",
    params(("request_id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "Celular vinculado e verificado", body = MobileLinkRequest),
        (status = 404, description = "Solicitação não encontrada")
    )
)]
pub async fn approve_link(
    State(app_state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.mobile_service.approve(&app_state.db_pool, request_id).await?;
    Ok((StatusCode::OK, Json(request)))
}
