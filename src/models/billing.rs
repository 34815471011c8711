// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

// O status é informativo: a matemática do saldo ignora ele (a view do razão
// usa toda fatura não cancelada como débito).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Partial,
    Cancelled,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Uuid,

    // Chave natural junto com customer_id (a numeração não é global).
    #[schema(example = "INV-100")]
    pub invoice_no: String,

    #[schema(value_type = String, format = Date, example = "2024-04-01")]
    pub date: NaiveDate,

    // Imutável depois de criada: quitações são registros separados.
    #[schema(example = "5000.00")]
    pub total_amount: Decimal,

    pub status: InvoiceStatus,
    pub source: String,
    pub locked: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub invoice_id: Option<Uuid>,

    #[schema(example = "RCPT-55")]
    pub receipt_no: String,

    #[schema(value_type = String, format = Date, example = "2024-04-10")]
    pub payment_date: NaiveDate,

    #[schema(example = "3000.00")]
    pub amount: Decimal,

    // cash / upi / bank / cheque / adjustment — texto livre, como vem da fonte.
    #[schema(example = "cash")]
    pub mode: String,

    pub reference_no: Option<String>,
    pub source: String,
    pub created_at: Option<DateTime<Utc>>,
}

// Fatura + reconciliação (quanto já foi pago / quanto falta), calculada por
// soma dos pagamentos vinculados na hora da consulta.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceWithDue {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub invoice_no: String,

    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,

    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,

    // Derivado de paid/due, não o status armazenado.
    #[schema(example = "partial")]
    pub status: String,
}
