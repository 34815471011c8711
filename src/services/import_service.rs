// src/services/import_service.rs
//
// Pipeline frouxo (planilha auto-detectável): o upload só aceita e encosta
// o lote no staging; a reconciliação roda num sync explícito disparado pelo
// cliente depois. Commit por linha — o arquivo vem de ferramenta de
// terceiros, meio torto por natureza, e linha ruim não pode derrubar irmã.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ImportLogRepository, StagingRepository},
    imports::detect::detect_file_type,
    imports::hash::file_hash,
    imports::rows::{validate_and_map, MappedRows},
    imports::spreadsheet::{parse_workbook, RawRow},
    models::imports::{
        FileKind, ImportLog, ImportStatus, RowError, StagingImport, StagingStatus, SyncResponse,
    },
    services::reconciliation::{CommitMode, ReconciliationEngine},
};

const IMPORT_SOURCE: &str = "excel_import";

// O que fica guardado no JSONB do staging: os cabeçalhos na ordem original
// mais as linhas cruas.
#[derive(Debug, Serialize, Deserialize)]
struct StagedPayload {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

#[derive(Clone)]
pub struct ImportService {
    staging_repo: StagingRepository,
    log_repo: ImportLogRepository,
    engine: ReconciliationEngine,
}

impl ImportService {
    pub fn new(
        staging_repo: StagingRepository,
        log_repo: ImportLogRepository,
        engine: ReconciliationEngine,
    ) -> Self {
        Self { staging_repo, log_repo, engine }
    }

    // =========================================================================
    //  UPLOAD (aceite + staging)
    // =========================================================================

    pub async fn accept_upload(
        &self,
        pool: &PgPool,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StagingImport, AppError> {
        if bytes.is_empty() {
            return Err(AppError::EmptyFile);
        }

        // Guarda de arquivo duplicado ANTES de pagar o parse.
        let hash = file_hash(bytes);
        if let Some(log) = self.log_repo.find_import_by_hash(pool, &hash).await? {
            return Err(AppError::DuplicateFile { import_id: log.id, imported_at: log.imported_at });
        }
        if let Some(staged) = self.staging_repo.find_by_hash(pool, &hash).await? {
            return Err(AppError::DuplicateFile {
                import_id: staged.id,
                imported_at: staged.created_at,
            });
        }

        let (headers, rows) = parse_workbook(bytes)?;
        if rows.is_empty() {
            return Err(AppError::EmptyFile);
        }

        let detected = detect_file_type(&headers).ok_or(AppError::UnrecognizedFileType)?;

        let payload = serde_json::to_value(StagedPayload { headers, rows })
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        let staging = self
            .staging_repo
            .insert(pool, file_name, &hash, detected, &payload)
            .await?;

        tracing::info!(
            "📥 Upload aceito: {} ({:?}, {} linhas) -> staging {}",
            file_name,
            detected,
            staging.raw_rows["rows"].as_array().map(|a| a.len()).unwrap_or(0),
            staging.id
        );

        Ok(staging)
    }

    // =========================================================================
    //  SYNC (staging -> tabelas canônicas)
    // =========================================================================

    pub async fn sync(&self, pool: &PgPool, import_id: Uuid) -> Result<SyncResponse, AppError> {
        let staging = self
            .staging_repo
            .find_by_id(pool, import_id)
            .await?
            .ok_or(AppError::ImportNotFound)?;

        // Um lote terminal nunca roda de novo.
        if staging.status != StagingStatus::Pending {
            return Err(AppError::ImportAlreadyProcessed);
        }

        let payload: StagedPayload = serde_json::from_value(staging.raw_rows.clone())
            .map_err(|e| AppError::InternalServerError(e.into()))?;
        let total_rows = payload.rows.len();

        // Catálogo de produtos fica fora deste núcleo: o lote morre aqui,
        // explicitamente, em vez de "processar" zero linhas em silêncio.
        if staging.detected_type == FileKind::Products {
            let errors = vec![RowError::new(1, "Product catalog import is not supported")];
            self.finish(pool, &staging, total_rows, 0, 0, 0, &errors, StagingStatus::Failed)
                .await?;
            return Ok(SyncResponse { processed: 0, duplicates: 0, errors });
        }

        let today = Utc::now().date_naive();
        let (mapped, mut all_errors) =
            match validate_and_map(staging.detected_type, &payload.headers, &payload.rows, today) {
                Ok(result) => result,
                Err(structural) => {
                    // Cabeçalho obrigatório sumiu entre o aceite e o sync:
                    // o lote inteiro é rejeitado, com registro.
                    let errors = vec![RowError::new(1, structural.to_string())];
                    self.finish(pool, &staging, total_rows, 0, 0, 0, &errors, StagingStatus::Failed)
                        .await?;
                    return Ok(SyncResponse { processed: 0, duplicates: 0, errors });
                }
            };

        let outcome = match &mapped {
            MappedRows::Customers(rows) => {
                self.engine
                    .reconcile_party_rows(pool, rows, IMPORT_SOURCE, CommitMode::PerRow)
                    .await?
            }
            MappedRows::Ledger(rows) => {
                self.engine
                    .reconcile_ledger_rows(pool, rows, IMPORT_SOURCE, CommitMode::PerRow)
                    .await?
            }
            MappedRows::Invoices(rows) => {
                self.engine
                    .reconcile_invoice_rows(pool, rows, IMPORT_SOURCE, CommitMode::PerRow)
                    .await?
            }
        };

        let validation_failed = all_errors.len();
        all_errors.extend(outcome.errors.iter().cloned());
        let failed_rows = validation_failed + outcome.failed;

        // Lote que não fez nada e não explicou nada é uma anomalia em si.
        if outcome.inserted == 0 && outcome.skipped == 0 && all_errors.is_empty() {
            all_errors.push(RowError::new(1, "No valid rows found to process"));
        }

        let staging_status = if outcome.inserted > 0 {
            if all_errors.is_empty() { StagingStatus::Processed } else { StagingStatus::Partial }
        } else if all_errors.is_empty() {
            // Só duplicatas: o lote é um re-envio legítimo.
            StagingStatus::Processed
        } else {
            StagingStatus::Failed
        };

        self.finish(
            pool,
            &staging,
            total_rows,
            outcome.inserted,
            outcome.skipped,
            failed_rows,
            &all_errors,
            staging_status,
        )
        .await?;

        tracing::info!(
            "✅ Sync {}: {} inseridas, {} duplicadas, {} erros",
            staging.id,
            outcome.inserted,
            outcome.skipped,
            all_errors.len()
        );

        Ok(SyncResponse {
            processed: outcome.inserted,
            duplicates: outcome.skipped,
            errors: all_errors,
        })
    }

    // Fecha o staging e grava o log de importação — exatamente um log
    // terminal por lote aceito.
    async fn finish(
        &self,
        pool: &PgPool,
        staging: &StagingImport,
        total_rows: usize,
        inserted: usize,
        skipped: usize,
        failed: usize,
        errors: &[RowError],
        status: StagingStatus,
    ) -> Result<(), AppError> {
        let error_json = if errors.is_empty() {
            None
        } else {
            Some(serde_json::to_value(errors).map_err(|e| AppError::InternalServerError(e.into()))?)
        };

        self.staging_repo
            .finish(pool, staging.id, status, inserted as i32, error_json.as_ref())
            .await?;

        let import_status = match status {
            StagingStatus::Processed => ImportStatus::Success,
            StagingStatus::Partial => ImportStatus::Partial,
            _ => ImportStatus::Failed,
        };

        self.log_repo
            .insert_import_log(
                pool,
                &staging.file_name,
                &staging.file_hash,
                staging.detected_type,
                total_rows as i32,
                inserted as i32,
                skipped as i32,
                failed as i32,
                error_json.as_ref(),
                import_status,
            )
            .await?;

        Ok(())
    }

    // =========================================================================
    //  HISTÓRICO
    // =========================================================================

    pub async fn list_logs(
        &self,
        pool: &PgPool,
        import_type: Option<FileKind>,
        limit: i64,
    ) -> Result<Vec<ImportLog>, AppError> {
        self.log_repo.list_import_logs(pool, import_type, limit).await
    }
}
