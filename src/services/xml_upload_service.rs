// src/services/xml_upload_service.rs
//
// Pipeline XML estrito em três estágios: clientes -> notas -> recibos.
// Cada estágio só abre depois de um upload success/partial do anterior —
// fricção intencional para impedir fatura órfã apontando para parte que
// ninguém subiu. Commit por chunk de 500 (throughput), seguindo em frente
// depois de falha de linha dentro do chunk.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ImportLogRepository,
    imports::hash::file_hash,
    imports::xml::{extract_bills, extract_customers, extract_payments},
    models::imports::{
        BatchSummary, ImportStatus, RowError, UploadKind, UploadResponse, UploadStatus,
    },
    services::reconciliation::{BatchOutcome, CommitMode, ReconciliationEngine, XML_CHUNK_SIZE},
};

// Amostra de erros devolvida na resposta; o conjunto completo fica no log
// e sai pelo relatório CSV.
const ERROR_SAMPLE_LIMIT: usize = 100;

#[derive(Clone)]
pub struct XmlUploadService {
    log_repo: ImportLogRepository,
    engine: ReconciliationEngine,
}

impl XmlUploadService {
    pub fn new(log_repo: ImportLogRepository, engine: ReconciliationEngine) -> Self {
        Self { log_repo, engine }
    }

    // =========================================================================
    //  STATUS / GATE DE ORDEM
    // =========================================================================

    pub async fn upload_status(&self, pool: &PgPool) -> Result<UploadStatus, AppError> {
        let customers = self.log_repo.has_completed_upload(pool, UploadKind::Customers).await?;
        let bills = self.log_repo.has_completed_upload(pool, UploadKind::Bills).await?;
        let payments = self.log_repo.has_completed_upload(pool, UploadKind::Payments).await?;

        Ok(UploadStatus {
            customers_uploaded: customers,
            bills_uploaded: bills,
            payments_uploaded: payments,
            can_upload_bills: customers,
            can_upload_payments: bills,
        })
    }

    // =========================================================================
    //  ESTÁGIOS
    // =========================================================================

    pub async fn upload_customers(
        &self,
        pool: &PgPool,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadResponse, AppError> {
        let (hash, xml) = self.prepare(pool, bytes).await?;

        let records = extract_customers(&xml)?;
        if records.is_empty() {
            return Err(AppError::NoRecordsFound);
        }

        let outcome = self
            .engine
            .reconcile_xml_customers(pool, &records, CommitMode::Chunked(XML_CHUNK_SIZE))
            .await?;

        self.log_and_respond(pool, file_name, &hash, UploadKind::Customers, outcome).await
    }

    pub async fn upload_bills(
        &self,
        pool: &PgPool,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadResponse, AppError> {
        let status = self.upload_status(pool).await?;
        if !status.can_upload_bills {
            return Err(AppError::UploadOrderViolation(
                "Customers XML must be uploaded before Bills XML",
            ));
        }

        let (hash, xml) = self.prepare(pool, bytes).await?;

        let records = extract_bills(&xml)?;
        if records.is_empty() {
            return Err(AppError::NoRecordsFound);
        }

        let outcome = self
            .engine
            .reconcile_xml_bills(pool, &records, CommitMode::Chunked(XML_CHUNK_SIZE))
            .await?;

        self.log_and_respond(pool, file_name, &hash, UploadKind::Bills, outcome).await
    }

    pub async fn upload_payments(
        &self,
        pool: &PgPool,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadResponse, AppError> {
        let status = self.upload_status(pool).await?;
        if !status.can_upload_payments {
            return Err(AppError::UploadOrderViolation(
                "Bills XML must be uploaded before Payments XML",
            ));
        }

        let (hash, xml) = self.prepare(pool, bytes).await?;

        let records = extract_payments(&xml)?;
        if records.is_empty() {
            return Err(AppError::NoRecordsFound);
        }

        let outcome = self
            .engine
            .reconcile_xml_payments(pool, &records, CommitMode::Chunked(XML_CHUNK_SIZE))
            .await?;

        self.log_and_respond(pool, file_name, &hash, UploadKind::Payments, outcome).await
    }

    // Hash + guarda de duplicidade + decodificação, comum aos três estágios.
    async fn prepare(&self, pool: &PgPool, bytes: &[u8]) -> Result<(String, String), AppError> {
        if bytes.is_empty() {
            return Err(AppError::EmptyFile);
        }

        let hash = file_hash(bytes);
        if let Some(log) = self.log_repo.find_upload_by_hash(pool, &hash).await? {
            return Err(AppError::DuplicateFile { import_id: log.id, imported_at: log.uploaded_at });
        }

        let xml = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::XmlParse("file is not valid UTF-8".to_string()))?;

        Ok((hash, xml))
    }

    // Exatamente um upload log por execução de estágio.
    async fn log_and_respond(
        &self,
        pool: &PgPool,
        file_name: &str,
        file_hash: &str,
        upload_type: UploadKind,
        outcome: BatchOutcome,
    ) -> Result<UploadResponse, AppError> {
        // Sem falha nenhuma = success (mesmo que tudo tenha sido pulado);
        // falhas com algo inserido = partial.
        let status = outcome.status();

        let error_json = if outcome.errors.is_empty() {
            None
        } else {
            Some(
                serde_json::to_value(&outcome.errors)
                    .map_err(|e| AppError::InternalServerError(e.into()))?,
            )
        };

        let log = self
            .log_repo
            .insert_upload_log(
                pool,
                file_name,
                file_hash,
                upload_type,
                outcome.total as i32,
                outcome.inserted as i32,
                outcome.skipped as i32,
                outcome.failed as i32,
                error_json.as_ref(),
                status,
            )
            .await?;

        tracing::info!(
            "📤 Upload XML {:?} ({}): {} inseridos, {} pulados, {} falhas",
            upload_type,
            file_name,
            outcome.inserted,
            outcome.skipped,
            outcome.failed
        );

        let mut errors = outcome.errors;
        errors.truncate(ERROR_SAMPLE_LIMIT);

        Ok(UploadResponse {
            success: status != ImportStatus::Failed,
            summary: BatchSummary {
                total: outcome.total,
                inserted: outcome.inserted,
                skipped: outcome.skipped,
                failed: outcome.failed,
            },
            errors,
            upload_log_id: log.id,
        })
    }

    // =========================================================================
    //  RELATÓRIO DE ERROS (CSV completo por log id)
    // =========================================================================

    pub async fn error_report_csv(
        &self,
        pool: &PgPool,
        upload_log_id: Uuid,
    ) -> Result<(String, String), AppError> {
        let log = self
            .log_repo
            .find_upload_log(pool, upload_log_id)
            .await?
            .ok_or(AppError::UploadLogNotFound)?;

        let Some(error_log) = log.error_log else {
            return Err(AppError::UploadLogNotFound);
        };

        let errors: Vec<RowError> = serde_json::from_value(error_log)
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        let csv = render_error_csv(&errors);
        let file_name = format!("{}_errors.csv", log.file_name);
        Ok((file_name, csv))
    }
}

fn render_error_csv(errors: &[RowError]) -> String {
    let mut csv = String::from("Row,Field,Reason\n");
    for e in errors {
        let reason = e.reason.replace('"', "\"\"");
        csv.push_str(&format!(
            "{},{},\"{}\"\n",
            e.row,
            e.field.as_deref().unwrap_or(""),
            reason
        ));
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_quotes_reasons() {
        let errors = vec![
            RowError::with_field(3, "mobile", "Invalid or missing mobile number"),
            RowError::new(7, "Customer not found: \"X\""),
        ];
        let csv = render_error_csv(&errors);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Row,Field,Reason");
        assert_eq!(lines[1], "3,mobile,\"Invalid or missing mobile number\"");
        assert_eq!(lines[2], "7,,\"Customer not found: \"\"X\"\"\"");
    }
}
