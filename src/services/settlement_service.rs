// src/services/settlement_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InvoiceRepository, PaymentRepository},
    models::billing::{InvoiceStatus, Payment},
};

#[derive(Clone)]
pub struct SettlementService {
    invoice_repo: InvoiceRepository,
    payment_repo: PaymentRepository,
}

impl SettlementService {
    pub fn new(invoice_repo: InvoiceRepository, payment_repo: PaymentRepository) -> Self {
        Self { invoice_repo, payment_repo }
    }

    // Quitação manual de fatura. O "quanto falta" é calculado na hora,
    // somando os pagamentos vinculados — nunca de um campo cacheado.
    pub async fn settle_invoice(
        &self,
        pool: &PgPool,
        invoice_id: Uuid,
        amount: Decimal,
        payment_date: NaiveDate,
        payment_mode: Option<&str>,
        reference_no: Option<&str>,
    ) -> Result<Payment, AppError> {
        let invoice = self
            .invoice_repo
            .find_by_id(pool, invoice_id)
            .await?
            .ok_or(AppError::InvoiceNotFound)?;

        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidSettlementAmount);
        }

        let total_paid = self.payment_repo.sum_for_invoice(pool, invoice_id).await?;
        let remaining_due = invoice.total_amount - total_paid;

        if amount > remaining_due {
            return Err(AppError::SettlementExceedsDue {
                remaining_due,
                total_paid,
                invoice_total: invoice.total_amount,
            });
        }

        if let Some(existing) = self
            .payment_repo
            .find_settlement_duplicate(pool, invoice_id, amount, payment_date)
            .await?
        {
            return Err(AppError::DuplicateSettlement { existing_payment_id: existing });
        }

        let generated;
        let receipt_no = match reference_no {
            Some(r) => r,
            None => {
                generated = format!("SETTLE-{}", Utc::now().timestamp_millis());
                &generated
            }
        };

        let payment = self
            .payment_repo
            .insert(
                pool,
                invoice.customer_id,
                Some(invoice.id),
                receipt_no,
                payment_date,
                amount,
                payment_mode.unwrap_or("Cash"),
                reference_no,
                "manual_settlement",
            )
            .await?;

        tracing::info!(
            "💰 Quitação registrada: fatura {} valor {} ({})",
            invoice.invoice_no,
            amount,
            payment.receipt_no
        );

        Ok(payment)
    }

    // Rotina de integridade: toda fatura 'paid' sem pagamento correspondente
    // ganha um pagamento de ajuste, para o razão derivado fechar. Nunca toca
    // em campo de saldo — só insere registros canônicos.
    pub async fn fix_ledger_integrity(&self, pool: &PgPool) -> Result<u32, AppError> {
        let paid_invoices = self.invoice_repo.list_by_status(pool, InvoiceStatus::Paid).await?;
        tracing::info!("🔧 Verificando integridade de {} faturas pagas", paid_invoices.len());

        let mut fixed = 0u32;
        for invoice in paid_invoices {
            let already_settled = self
                .payment_repo
                .exists_same_day_amount(pool, invoice.customer_id, invoice.total_amount, invoice.date)
                .await?;
            if already_settled {
                continue;
            }

            let mut tx = pool.begin().await?;
            let receipt_no = format!("FIX-{}", invoice.invoice_no);
            let reference = format!("INV-{}", invoice.invoice_no);
            self.payment_repo
                .insert(
                    &mut *tx,
                    invoice.customer_id,
                    Some(invoice.id),
                    &receipt_no,
                    invoice.date,
                    invoice.total_amount,
                    "adjustment",
                    Some(&reference),
                    "system-fix",
                )
                .await?;
            tx.commit().await?;

            tracing::info!("  -> Fatura {} recebeu pagamento de ajuste", invoice.invoice_no);
            fixed += 1;
        }

        Ok(fixed)
    }
}
