// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

// Convenção de sinal do saldo de abertura:
// receivable = eles nos devem (positivo), payable = nós devemos (negativo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "balance_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BalanceType {
    Receivable,
    Payable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "link_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkRequestStatus {
    Pending,
    Approved,
    Rejected,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "ABC School")]
    pub name: String,

    // Pode ser um placeholder sintético ("00...") até a verificação.
    #[schema(example = "9876543210")]
    pub mobile: String,

    pub mobile_verified: bool,

    // Código externo vindo do export (Tally GUID etc.)
    pub customer_code: Option<String>,

    pub address: Option<String>,

    // Saldo anterior à história registrada no sistema.
    #[schema(example = "1500.50")]
    pub opening_balance: Decimal,

    pub balance_type: BalanceType,

    // Travado por uma importação autoritativa: importações posteriores não
    // sobrescrevem os campos em silêncio.
    pub locked: bool,

    #[schema(example = "tally")]
    pub source: String,

    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MobileLinkRequest {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub customer_id: Option<Uuid>,
    pub status: LinkRequestStatus,
    pub created_at: Option<DateTime<Utc>>,
}
