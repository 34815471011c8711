// src/handlers/dashboard.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::ledger::DashboardResponse,
    services::ledger_service::DashboardQuery,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardParams {
    // 'monthly' | 'yearly' | 'all' (default). Datas explícitas vencem.
    #[param(example = "monthly")]
    pub period: Option<String>,

    #[param(value_type = Option<String>, example = "2024-04-01")]
    pub start_date: Option<NaiveDate>,

    #[param(value_type = Option<String>, example = "2024-04-30")]
    pub end_date: Option<NaiveDate>,

    pub page: Option<i64>,

    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

// GET /api/dashboard/{customer_id}
// A identidade viria da sessão; como a camada de auth fica fora deste
// núcleo, o id chega na rota.
#[utoipa::path(
    get,
    path = "/api/dashboard/{customer_id}",
    tag = "Dashboard",
    params(
        ("customer_id" = Uuid, Path, description = "ID do cliente"),
        DashboardParams
    ),
    responses(
        (status = 200, description = "Perfil, extrato, faturas, pagamentos e resumo", body = DashboardResponse),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state
        .ledger_service
        .dashboard(
            &app_state.db_pool,
            customer_id,
            DashboardQuery {
                period: params.period,
                start_date: params.start_date,
                end_date: params.end_date,
                page: params.page,
                page_size: params.page_size,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(response)))
}
