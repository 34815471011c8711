// src/models/ledger.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::billing::{InvoiceWithDue, Payment};
use crate::models::customer::Customer;

// Linha da customer_ledger_view. Derivada, nunca gravada: débitos vêm das
// faturas, créditos dos pagamentos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub source_id: Uuid,

    // 'invoice' ou 'payment'
    pub entry_type: String,

    pub customer_id: Uuid,

    #[schema(value_type = String, format = Date)]
    pub entry_date: NaiveDate,

    pub debit: Decimal,
    pub credit: Decimal,

    // 'INV-<nº>' ou 'PAY-<nº>'
    pub description: String,

    pub created_at: Option<DateTime<Utc>>,
}

// Linha do razão como o dashboard exibe: com saldo corrente calculado no
// passo da listagem (a view não guarda saldo).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDisplayRow {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub entry_type: String,

    #[schema(value_type = String, format = Date)]
    pub entry_date: NaiveDate,

    pub reference_no: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub opening_balance: Decimal,
    pub total_purchases: Decimal,
    pub total_paid: Decimal,
    pub current_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    #[schema(example = "Apr")]
    pub month: String,
    pub total_purchase: Decimal,
    pub total_paid: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInfo {
    #[schema(example = "monthly")]
    pub period_type: String,

    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,

    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

// Resposta completa do dashboard do cliente.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub customer: Customer,

    // Mais recente primeiro, com saldo corrente por linha.
    pub ledger: Vec<LedgerDisplayRow>,

    pub invoices: Vec<InvoiceWithDue>,
    pub payments: Vec<Payment>,
    pub summary: LedgerSummary,
    pub monthly: Vec<MonthlyStat>,
    pub period: PeriodInfo,
    pub pagination: Option<PaginationInfo>,
}
