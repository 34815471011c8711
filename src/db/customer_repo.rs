// src/db/customer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{BalanceType, Customer, LinkRequestStatus, MobileLinkRequest},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  BUSCAS
    // =========================================================================

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    // A identidade de importação é o nome aparado, caso-insensível.
    pub async fn find_by_name_ci<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE lower(trim(name)) = lower(trim($1)) LIMIT 1",
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_code<'e, E>(
        &self,
        executor: E,
        code: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE customer_code = $1 LIMIT 1")
                .bind(code)
                .fetch_optional(executor)
                .await?;
        Ok(customer)
    }

    pub async fn find_by_name_and_mobile<'e, E>(
        &self,
        executor: E,
        name: &str,
        mobile: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE name = $1 AND mobile = $2 LIMIT 1",
        )
        .bind(name)
        .bind(mobile)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    // =========================================================================
    //  INSERÇÕES
    // =========================================================================

    pub async fn insert_imported<'e, E>(
        &self,
        executor: E,
        name: &str,
        mobile: &str,
        address: Option<&str>,
        opening_balance: Decimal,
        balance_type: BalanceType,
        locked: bool,
        source: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, mobile, address, opening_balance, balance_type, locked, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(mobile)
        .bind(address)
        .bind(opening_balance)
        .bind(balance_type)
        .bind(locked)
        .bind(source)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    // Cliente de ficha mínima para transações que referenciam um nome
    // desconhecido (caminho permissivo do razão).
    pub async fn insert_placeholder<'e, E>(
        &self,
        executor: E,
        name: &str,
        mobile: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, mobile, opening_balance, balance_type, source)
            VALUES ($1, $2, 0, 'receivable', 'auto-created')
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(mobile)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn insert_from_xml<'e, E>(
        &self,
        executor: E,
        name: &str,
        mobile: &str,
        customer_code: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, mobile, customer_code, source)
            VALUES ($1, $2, $3, 'xml_upload')
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(mobile)
        .bind(customer_code)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    // =========================================================================
    //  ATUALIZAÇÃO NÃO-DESTRUTIVA (importação)
    // =========================================================================
    // Campos já preenchidos vencem o vazio da importação: um celular real
    // nunca é trocado por placeholder, endereço existente fica.

    pub async fn update_from_import<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        opening_balance: Decimal,
        balance_type: BalanceType,
        mobile: Option<&str>,
        address: Option<&str>,
        source: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                opening_balance = $2,
                balance_type = $3,
                mobile = CASE
                    WHEN length(trim(mobile)) > 5 AND mobile NOT LIKE '00%' THEN mobile
                    ELSE COALESCE($4, mobile)
                END,
                address = COALESCE(address, $5),
                locked = TRUE,
                source = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(opening_balance)
        .bind(balance_type)
        .bind(mobile)
        .bind(address)
        .bind(source)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    // =========================================================================
    //  VÍNCULO DE CELULAR
    // =========================================================================

    pub async fn link_mobile<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        mobile: &str,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET mobile = $2, mobile_verified = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(customer_id)
        .bind(mobile)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn insert_link_request<'e, E>(
        &self,
        executor: E,
        name: &str,
        mobile: &str,
        customer_id: Option<Uuid>,
    ) -> Result<MobileLinkRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, MobileLinkRequest>(
            r#"
            INSERT INTO mobile_link_requests (name, mobile, customer_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(mobile)
        .bind(customer_id)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn find_link_request<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<MobileLinkRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request =
            sqlx::query_as::<_, MobileLinkRequest>("SELECT * FROM mobile_link_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(request)
    }

    pub async fn set_link_request_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: LinkRequestStatus,
    ) -> Result<MobileLinkRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, MobileLinkRequest>(
            "UPDATE mobile_link_requests SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }
}
