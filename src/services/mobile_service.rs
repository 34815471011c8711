// src/services/mobile_service.rs
//
// Fluxo mínimo de vínculo de celular: o cliente pede o vínculo, o operador
// aprova, o celular do cadastro passa a ser verificado.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{LinkRequestStatus, MobileLinkRequest},
};

#[derive(Clone)]
pub struct MobileService {
    customer_repo: CustomerRepository,
}

impl MobileService {
    pub fn new(customer_repo: CustomerRepository) -> Self {
        Self { customer_repo }
    }

    pub async fn request_link(
        &self,
        pool: &PgPool,
        name: &str,
        mobile: &str,
    ) -> Result<MobileLinkRequest, AppError> {
        // Tenta casar com um cliente existente pelo nome; o operador decide
        // na aprovação.
        let matched = self.customer_repo.find_by_name_ci(pool, name).await?;

        self.customer_repo
            .insert_link_request(pool, name, mobile, matched.map(|c| c.id))
            .await
    }

    pub async fn approve(&self, pool: &PgPool, request_id: Uuid) -> Result<MobileLinkRequest, AppError> {
        let request = self
            .customer_repo
            .find_link_request(pool, request_id)
            .await?
            .ok_or(AppError::LinkRequestNotFound)?;

        let customer_id = request.customer_id.ok_or(AppError::CustomerNotFound)?;

        let mut tx = pool.begin().await?;
        self.customer_repo.link_mobile(&mut *tx, customer_id, &request.mobile).await?;
        let updated = self
            .customer_repo
            .set_link_request_status(&mut *tx, request_id, LinkRequestStatus::Approved)
            .await?;
        tx.commit().await?;

        tracing::info!("📱 Celular {} vinculado ao cliente {}", updated.mobile, customer_id);
        Ok(updated)
    }
}
