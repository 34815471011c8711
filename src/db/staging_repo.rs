// src/db/staging_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::imports::{FileKind, StagingImport, StagingStatus},
};

#[derive(Clone)]
pub struct StagingRepository {
    pool: PgPool,
}

impl StagingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // "Upload aceito" desacoplado de "lote aplicado": o arquivo entra aqui
    // pendente e o sync explícito processa depois.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        file_name: &str,
        file_hash: &str,
        detected_type: FileKind,
        raw_rows: &Value,
    ) -> Result<StagingImport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staging = sqlx::query_as::<_, StagingImport>(
            r#"
            INSERT INTO staging_imports (file_name, file_hash, detected_type, raw_rows)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(file_name)
        .bind(file_hash)
        .bind(detected_type)
        .bind(raw_rows)
        .fetch_one(executor)
        .await?;
        Ok(staging)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<StagingImport>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staging = sqlx::query_as::<_, StagingImport>("SELECT * FROM staging_imports WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(staging)
    }

    // Lotes pendentes também contam na guarda de arquivo duplicado.
    pub async fn find_by_hash<'e, E>(
        &self,
        executor: E,
        file_hash: &str,
    ) -> Result<Option<StagingImport>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staging =
            sqlx::query_as::<_, StagingImport>("SELECT * FROM staging_imports WHERE file_hash = $1 LIMIT 1")
                .bind(file_hash)
                .fetch_optional(executor)
                .await?;
        Ok(staging)
    }

    // Transição terminal; um lote processado nunca volta a pending.
    pub async fn finish<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StagingStatus,
        processed_count: i32,
        error_log: Option<&Value>,
    ) -> Result<StagingImport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staging = sqlx::query_as::<_, StagingImport>(
            r#"
            UPDATE staging_imports
            SET status = $2, processed_count = $3, error_log = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(processed_count)
        .bind(error_log)
        .fetch_one(executor)
        .await?;
        Ok(staging)
    }
}
