// src/db/ledger_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::ledger::{LedgerEntry, MonthlyStat},
};

// Tudo aqui é LEITURA da customer_ledger_view. Nada escreve nela — o saldo
// é sempre derivado das tabelas de faturas e pagamentos.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Variação de saldo anterior à janela: SUM(debit - credit) antes do início.
    pub async fn sum_before<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        before: NaiveDate,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let change = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(debit - credit), 0)
            FROM customer_ledger_view
            WHERE customer_id = $1 AND entry_date < $2
            "#,
        )
        .bind(customer_id)
        .bind(before)
        .fetch_one(executor)
        .await?;
        Ok(change)
    }

    // Totais do período: (compras, pagamentos). Limites inclusivos; limite
    // ausente = lado aberto.
    pub async fn period_totals<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<(Decimal, Decimal), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(debit), 0), COALESCE(SUM(credit), 0)
            FROM customer_ledger_view
            WHERE customer_id = $1
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
            "#,
        )
        .bind(customer_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(executor)
        .await?;
        Ok(totals)
    }

    // Extrato cronológico (asc); o serviço calcula o saldo corrente andando
    // nessa ordem e inverte para exibição.
    pub async fn list_entries<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<LedgerEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT * FROM customer_ledger_view
            WHERE customer_id = $1
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
            ORDER BY entry_date ASC, created_at ASC
            LIMIT 1000
            "#,
        )
        .bind(customer_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }

    pub async fn monthly_stats<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<MonthlyStat>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, MonthlyStat>(
            r#"
            SELECT
                to_char(entry_date, 'Mon') AS month,
                COALESCE(SUM(debit), 0)  AS total_purchase,
                COALESCE(SUM(credit), 0) AS total_paid
            FROM customer_ledger_view
            WHERE customer_id = $1
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
            GROUP BY to_char(entry_date, 'Mon'), EXTRACT(MONTH FROM entry_date)
            ORDER BY EXTRACT(MONTH FROM entry_date)
            "#,
        )
        .bind(customer_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(executor)
        .await?;
        Ok(stats)
    }
}
