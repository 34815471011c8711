// src/db/invoice_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::billing::{Invoice, InvoiceStatus, InvoiceWithDue},
};

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(invoice)
    }

    // Chave natural do pipeline de planilha: (cliente, número).
    pub async fn find_id_by_customer_and_no<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        invoice_no: &str,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM invoices WHERE customer_id = $1 AND invoice_no = $2 LIMIT 1",
        )
        .bind(customer_id)
        .bind(invoice_no)
        .fetch_optional(executor)
        .await?;
        Ok(id)
    }

    // Chave do formato XML: (número da nota, data).
    pub async fn exists_by_no_and_date<'e, E>(
        &self,
        executor: E,
        invoice_no: &str,
        date: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM invoices WHERE invoice_no = $1 AND date = $2 LIMIT 1",
        )
        .bind(invoice_no)
        .bind(date)
        .fetch_optional(executor)
        .await?;
        Ok(id.is_some())
    }

    // Resolução de nota pelo número (estágio de pagamentos do XML).
    pub async fn find_by_no<'e, E>(
        &self,
        executor: E,
        invoice_no: &str,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE invoice_no = $1 LIMIT 1")
                .bind(invoice_no)
                .fetch_optional(executor)
                .await?;
        Ok(invoice)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        invoice_no: &str,
        date: NaiveDate,
        total_amount: Decimal,
        status: InvoiceStatus,
        source: &str,
        locked: bool,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (customer_id, invoice_no, date, total_amount, status, source, locked)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(invoice_no)
        .bind(date)
        .bind(total_amount)
        .bind(status)
        .bind(source)
        .bind(locked)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    // Faturas com reconciliação por soma dos pagamentos vinculados — o
    // pago/devido nunca vem de campo cacheado.
    pub async fn list_with_settlement<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<InvoiceWithDue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoices = sqlx::query_as::<_, InvoiceWithDue>(
            r#"
            SELECT
                i.id,
                i.customer_id,
                i.invoice_no,
                i.date,
                i.total_amount,
                COALESCE(SUM(p.amount), 0) AS paid_amount,
                (i.total_amount - COALESCE(SUM(p.amount), 0)) AS due_amount,
                CASE
                    WHEN i.total_amount - COALESCE(SUM(p.amount), 0) <= 0 THEN 'paid'
                    WHEN COALESCE(SUM(p.amount), 0) > 0 THEN 'partial'
                    ELSE 'unpaid'
                END AS status
            FROM invoices i
            LEFT JOIN payments p ON p.invoice_id = i.id
            WHERE i.customer_id = $1
              AND ($2::date IS NULL OR i.date >= $2)
              AND ($3::date IS NULL OR i.date <= $3)
            GROUP BY i.id
            ORDER BY i.date DESC
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
        Ok(invoices)
    }

    pub async fn count_for_customer<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM invoices i
            WHERE i.customer_id = $1
              AND ($2::date IS NULL OR i.date >= $2)
              AND ($3::date IS NULL OR i.date <= $3)
            "#,
        )
        .bind(customer_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    // Rotina de integridade: faturas 'paid' que talvez não tenham pagamento.
    pub async fn list_by_status<'e, E>(
        &self,
        executor: E,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoices = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE status = $1")
            .bind(status)
            .fetch_all(executor)
            .await?;
        Ok(invoices)
    }
}
