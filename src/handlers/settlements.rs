// src/handlers/settlements.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{common::error::AppError, config::AppState, models::billing::Payment};

// ---
// Validação customizada
// ---
fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleInvoicePayload {
    pub invoice_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "3000.00")]
    pub amount: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-04-10")]
    pub payment_date: NaiveDate,

    #[schema(example = "upi")]
    pub payment_mode: Option<String>,

    pub reference_no: Option<String>,
}

// POST /api/settlements
#[utoipa::path(
    post,
    path = "/api/settlements",
    tag = "Settlements",
    request_body = SettleInvoicePayload,
    responses(
        (status = 201, description = "Pagamento vinculado registrado", body = Payment),
        (status = 400, description = "Valor excede o devido, ou pagamento idêntico já existe"),
        (status = 404, description = "Fatura não encontrada")
    )
)]
pub async fn settle_invoice(
    State(app_state): State<AppState>,
    Json(payload): Json<SettleInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payment = app_state
        .settlement_service
        .settle_invoice(
            &app_state.db_pool,
            payload.invoice_id,
            payload.amount,
            payload.payment_date,
            payload.payment_mode.as_deref(),
            payload.reference_no.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// POST /api/admin/integrity-fix
// Fatura 'paid' sem pagamento correspondente ganha um ajuste, para o razão
// derivado fechar.
#[utoipa::path(
    post,
    path = "/api/admin/integrity-fix",
    tag = "Settlements",
    responses(
        (status = 200, description = "Quantidade de faturas corrigidas")
    )
)]
pub async fn integrity_fix(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let fixed = app_state.settlement_service.fix_ledger_integrity(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(json!({ "fixed": fixed }))))
}
