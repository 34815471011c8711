// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Import (planilha auto-detectável) ---
        handlers::imports::upload,
        handlers::imports::sync,
        handlers::imports::list_logs,

        // --- XML Upload (pipeline ordenado) ---
        handlers::xml_upload::status,
        handlers::xml_upload::upload_customers,
        handlers::xml_upload::upload_bills,
        handlers::xml_upload::upload_payments,
        handlers::xml_upload::error_report,

        // --- Dashboard ---
        handlers::dashboard::get_dashboard,

        // --- Settlements ---
        handlers::settlements::settle_invoice,
        handlers::settlements::integrity_fix,

        // --- Mobile ---
        handlers::mobile::request_link,
        handlers::mobile::approve_link,
    ),
    components(
        schemas(
            // --- Clientes ---
            models::customer::Customer,
            models::customer::BalanceType,
            models::customer::MobileLinkRequest,
            models::customer::LinkRequestStatus,

            // --- Faturamento ---
            models::billing::Invoice,
            models::billing::InvoiceStatus,
            models::billing::Payment,
            models::billing::InvoiceWithDue,

            // --- Importação ---
            models::imports::ImportLog,
            models::imports::UploadLog,
            models::imports::StagingImport,
            models::imports::RowError,
            models::imports::BatchSummary,
            models::imports::UploadResponse,
            models::imports::SyncResponse,
            models::imports::UploadStatus,
            models::imports::ImportStatus,
            models::imports::StagingStatus,
            models::imports::FileKind,
            models::imports::UploadKind,

            // --- Razão ---
            models::ledger::LedgerEntry,
            models::ledger::LedgerDisplayRow,
            models::ledger::LedgerSummary,
            models::ledger::MonthlyStat,
            models::ledger::PeriodInfo,
            models::ledger::PaginationInfo,
            models::ledger::DashboardResponse,
        )
    ),
    tags(
        (name = "Import", description = "Importação de planilhas com auto-detecção"),
        (name = "XML Upload", description = "Pipeline XML ordenado (clientes -> notas -> recibos)"),
        (name = "Dashboard", description = "Extrato e resumo financeiro derivados"),
        (name = "Settlements", description = "Quitação manual e integridade do razão"),
        (name = "Mobile", description = "Vínculo de celular")
    )
)]
pub struct ApiDoc;
