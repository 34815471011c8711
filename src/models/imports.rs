// src/models/imports.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "import_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "staging_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StagingStatus {
    Pending,
    Processed,
    Partial,
    Failed,
}

// Tipo detectado pelos cabeçalhos do arquivo (pipeline auto-detectável).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "file_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Customers,
    Products,
    Invoices,
    Ledger,
}

// Estágio do pipeline XML ordenado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "upload_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Customers,
    Bills,
    Payments,
}

// --- Erro de linha ---

// Diagnóstico por linha, acumulado no lote (nunca aborta as irmãs).
// Serializado como JSONB no error_log dos logs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    // 1-based, contando a linha de cabeçalho (linha 2 = primeira de dados).
    pub row: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub reason: String,
}

impl RowError {
    pub fn new(row: u32, reason: impl Into<String>) -> Self {
        Self { row, field: None, reason: reason.into() }
    }

    pub fn with_field(row: u32, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { row, field: Some(field.into()), reason: reason.into() }
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportLog {
    pub id: Uuid,
    pub file_name: String,

    // Guarda de duplicidade em nível de arquivo (UNIQUE no banco).
    pub file_hash: String,

    pub import_type: FileKind,
    pub total_rows: i32,
    pub imported_rows: i32,
    pub skipped_rows: i32,
    pub failed_rows: i32,

    #[schema(value_type = Option<Vec<RowError>>)]
    pub error_log: Option<Value>,

    pub status: ImportStatus,
    pub imported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadLog {
    pub id: Uuid,
    pub file_name: String,
    pub file_hash: String,
    pub upload_type: UploadKind,
    pub records_total: i32,
    pub records_success: i32,
    pub records_skipped: i32,
    pub records_failed: i32,

    #[schema(value_type = Option<Vec<RowError>>)]
    pub error_log: Option<Value>,

    pub status: ImportStatus,
    pub uploaded_at: Option<DateTime<Utc>>,
}

// Lote aceito aguardando o sync explícito do cliente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagingImport {
    pub id: Uuid,
    pub file_name: String,
    pub file_hash: String,
    pub detected_type: FileKind,
    pub status: StagingStatus,

    // As linhas cruas parseadas (mapas cabeçalho -> valor), como JSONB.
    #[schema(value_type = Object)]
    pub raw_rows: Value,

    #[schema(value_type = Option<Vec<RowError>>)]
    pub error_log: Option<Value>,

    pub processed_count: i32,
    pub created_at: Option<DateTime<Utc>>,
}

// --- Resumos de lote (respostas da API) ---

// Resultado consolidado de aplicar um lote: o HTTP 200 reflete que a
// requisição foi atendida, não que toda linha passou.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub summary: BatchSummary,

    // Amostra limitada (100 primeiros); o CSV completo sai pelo log id.
    pub errors: Vec<RowError>,

    pub upload_log_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub processed: usize,
    pub duplicates: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatus {
    pub customers_uploaded: bool,
    pub bills_uploaded: bool,
    pub payments_uploaded: bool,
    pub can_upload_bills: bool,
    pub can_upload_payments: bool,
}
