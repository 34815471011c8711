// src/db/import_log_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::imports::{FileKind, ImportLog, ImportStatus, UploadKind, UploadLog},
};

#[derive(Clone)]
pub struct ImportLogRepository {
    pool: PgPool,
}

impl ImportLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  GUARDA DE ARQUIVO DUPLICADO
    // =========================================================================
    // Checada ANTES de gastar parse num arquivo que já está no registro.

    pub async fn find_import_by_hash<'e, E>(
        &self,
        executor: E,
        file_hash: &str,
    ) -> Result<Option<ImportLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log =
            sqlx::query_as::<_, ImportLog>("SELECT * FROM import_logs WHERE file_hash = $1 LIMIT 1")
                .bind(file_hash)
                .fetch_optional(executor)
                .await?;
        Ok(log)
    }

    pub async fn find_upload_by_hash<'e, E>(
        &self,
        executor: E,
        file_hash: &str,
    ) -> Result<Option<UploadLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log =
            sqlx::query_as::<_, UploadLog>("SELECT * FROM upload_logs WHERE file_hash = $1 LIMIT 1")
                .bind(file_hash)
                .fetch_optional(executor)
                .await?;
        Ok(log)
    }

    // =========================================================================
    //  LOGS (planilha)
    // =========================================================================

    pub async fn insert_import_log<'e, E>(
        &self,
        executor: E,
        file_name: &str,
        file_hash: &str,
        import_type: FileKind,
        total_rows: i32,
        imported_rows: i32,
        skipped_rows: i32,
        failed_rows: i32,
        error_log: Option<&Value>,
        status: ImportStatus,
    ) -> Result<ImportLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, ImportLog>(
            r#"
            INSERT INTO import_logs
                (file_name, file_hash, import_type, total_rows, imported_rows,
                 skipped_rows, failed_rows, error_log, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(file_name)
        .bind(file_hash)
        .bind(import_type)
        .bind(total_rows)
        .bind(imported_rows)
        .bind(skipped_rows)
        .bind(failed_rows)
        .bind(error_log)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(log)
    }

    pub async fn list_import_logs<'e, E>(
        &self,
        executor: E,
        import_type: Option<FileKind>,
        limit: i64,
    ) -> Result<Vec<ImportLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let logs = sqlx::query_as::<_, ImportLog>(
            r#"
            SELECT * FROM import_logs
            WHERE ($1::file_kind IS NULL OR import_type = $1)
            ORDER BY imported_at DESC
            LIMIT $2
            "#,
        )
        .bind(import_type)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(logs)
    }

    // =========================================================================
    //  LOGS (XML) E GATE DE ORDEM
    // =========================================================================

    pub async fn insert_upload_log<'e, E>(
        &self,
        executor: E,
        file_name: &str,
        file_hash: &str,
        upload_type: UploadKind,
        records_total: i32,
        records_success: i32,
        records_skipped: i32,
        records_failed: i32,
        error_log: Option<&Value>,
        status: ImportStatus,
    ) -> Result<UploadLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, UploadLog>(
            r#"
            INSERT INTO upload_logs
                (file_name, file_hash, upload_type, records_total, records_success,
                 records_skipped, records_failed, error_log, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(file_name)
        .bind(file_hash)
        .bind(upload_type)
        .bind(records_total)
        .bind(records_success)
        .bind(records_skipped)
        .bind(records_failed)
        .bind(error_log)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(log)
    }

    // O estágio N só abre depois de um upload success/partial do estágio N-1.
    pub async fn has_completed_upload<'e, E>(
        &self,
        executor: E,
        upload_type: UploadKind,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM upload_logs
            WHERE upload_type = $1 AND status IN ('success', 'partial')
            ORDER BY uploaded_at DESC
            LIMIT 1
            "#,
        )
        .bind(upload_type)
        .fetch_optional(executor)
        .await?;
        Ok(id.is_some())
    }

    pub async fn find_upload_log<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<UploadLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, UploadLog>("SELECT * FROM upload_logs WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(log)
    }
}
