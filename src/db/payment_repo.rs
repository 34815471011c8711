// src/db/payment_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::billing::Payment};

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CHAVES DE DUPLICIDADE
    // =========================================================================

    // Com recibo explícito, a chave é (cliente, recibo).
    pub async fn exists_by_receipt<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        receipt_no: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM payments WHERE customer_id = $1 AND receipt_no = $2 LIMIT 1",
        )
        .bind(customer_id)
        .bind(receipt_no)
        .fetch_optional(executor)
        .await?;
        Ok(id.is_some())
    }

    // Sem recibo, o fallback é (cliente, data, valor, modo). Pode suprimir
    // dois pagamentos genuínos de mesmo dia e valor — comportamento herdado
    // da fonte, documentado.
    pub async fn exists_by_fallback_key<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        payment_date: NaiveDate,
        amount: Decimal,
        mode: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM payments
            WHERE customer_id = $1 AND payment_date = $2 AND amount = $3 AND mode = $4
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .bind(payment_date)
        .bind(amount)
        .bind(mode)
        .fetch_optional(executor)
        .await?;
        Ok(id.is_some())
    }

    // Chave do formato XML: (recibo, nota).
    pub async fn exists_for_invoice_receipt<'e, E>(
        &self,
        executor: E,
        invoice_id: Uuid,
        receipt_no: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM payments WHERE invoice_id = $1 AND receipt_no = $2 LIMIT 1",
        )
        .bind(invoice_id)
        .bind(receipt_no)
        .fetch_optional(executor)
        .await?;
        Ok(id.is_some())
    }

    // Quitação manual: (nota, valor, data) idênticos já registrados?
    pub async fn find_settlement_duplicate<'e, E>(
        &self,
        executor: E,
        invoice_id: Uuid,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM payments
            WHERE invoice_id = $1 AND amount = $2 AND payment_date = $3
            LIMIT 1
            "#,
        )
        .bind(invoice_id)
        .bind(amount)
        .bind(payment_date)
        .fetch_optional(executor)
        .await?;
        Ok(id)
    }

    // Checagem frouxa da rotina de integridade: mesmo cliente, valor e dia.
    pub async fn exists_same_day_amount<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM payments
            WHERE customer_id = $1 AND amount = $2 AND payment_date = $3
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .bind(amount)
        .bind(payment_date)
        .fetch_optional(executor)
        .await?;
        Ok(id.is_some())
    }

    // =========================================================================
    //  ESCRITA / LEITURA
    // =========================================================================

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        invoice_id: Option<Uuid>,
        receipt_no: &str,
        payment_date: NaiveDate,
        amount: Decimal,
        mode: &str,
        reference_no: Option<&str>,
        source: &str,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (customer_id, invoice_id, receipt_no, payment_date, amount, mode, reference_no, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(invoice_id)
        .bind(receipt_no)
        .bind(payment_date)
        .bind(amount)
        .bind(mode)
        .bind(reference_no)
        .bind(source)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    // Soma dos pagamentos vinculados — a única fonte do "quanto já foi pago".
    pub async fn sum_for_invoice<'e, E>(
        &self,
        executor: E,
        invoice_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn list_for_customer<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE customer_id = $1
              AND ($2::date IS NULL OR payment_date >= $2)
              AND ($3::date IS NULL OR payment_date <= $3)
            ORDER BY payment_date DESC
            LIMIT $4 OFFSET COALESCE($5, 0)
            "#,
        )
        .bind(customer_id)
        .bind(start_date)
        .bind(end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }
}
