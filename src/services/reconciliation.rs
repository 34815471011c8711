// src/services/reconciliation.rs
//
// O motor de reconciliação: transforma linhas validadas em estado canônico
// de clientes/faturas/pagamentos, com idempotência por chave natural.
//
// Duas decisões atravessam tudo aqui:
//  - granularidade de commit: o pipeline frouxo (planilha) comita por linha,
//    o pipeline estrito (XML) comita por chunk de 500. Mesmo motor, mesmo
//    formato de resultado.
//  - resolução de cliente: o caminho do razão auto-cria placeholder para
//    nome desconhecido; o caminho XML falha a linha (export confiável não
//    pode referenciar parte que não subiu no estágio anterior).

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::{CustomerRepository, InvoiceRepository, PaymentRepository},
    imports::coerce::{normalize_phone, parse_amount, parse_flexible_date},
    imports::rows::{InvoiceRow, LedgerTxnRow, PartyRow, TxnKind},
    imports::xml::{XmlBillRecord, XmlCustomerRecord, XmlPaymentRecord},
    models::billing::InvoiceStatus,
    models::imports::{ImportStatus, RowError},
};

pub const XML_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    // Um commit por linha: a falha sistêmica de uma linha não desfaz as irmãs.
    PerRow,
    // Um commit por chunk: throughput maior, a falha sistêmica derruba o chunk.
    Chunked(usize),
}

impl CommitMode {
    fn chunk_size(self) -> usize {
        match self {
            CommitMode::PerRow => 1,
            CommitMode::Chunked(n) => n.max(1),
        }
    }
}

// Destino de uma linha individual. Err(AppError) fica reservado para falha
// sistêmica (banco fora etc.), que aborta a transação corrente.
enum RowOutcome {
    Inserted,
    // Duplicata legítima; às vezes com nota para o operador (cliente locked).
    Skipped(Option<RowError>),
    // Falha de negócio da linha: referência não resolvida, data podre.
    Failed(RowError),
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl BatchOutcome {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Skipped(note) => {
                self.skipped += 1;
                if let Some(e) = note {
                    self.errors.push(e);
                }
            }
            RowOutcome::Failed(e) => {
                self.failed += 1;
                self.errors.push(e);
            }
        }
    }

    fn record_chunk_failure(&mut self, rows: &[u32], error: &AppError) {
        for row in rows {
            self.failed += 1;
            self.errors.push(RowError::new(*row, format!("Database error: {}", error)));
        }
    }

    pub fn status(&self) -> ImportStatus {
        if self.inserted > 0 {
            if self.errors.is_empty() { ImportStatus::Success } else { ImportStatus::Partial }
        } else if self.failed == 0 && self.errors.is_empty() && self.skipped > 0 {
            // Só duplicatas legítimas: re-envio idempotente, nada errado.
            ImportStatus::Success
        } else {
            ImportStatus::Failed
        }
    }
}

// Celular sintético para clientes auto-criados: prefixo "00" nunca colide
// com número real e é reconhecível como placeholder.
fn synthetic_mobile() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..100_000_000);
    format!("00{:08}", n)
}

fn generated_receipt_no() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("PAY-{}-{:04}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    customer_repo: CustomerRepository,
    invoice_repo: InvoiceRepository,
    payment_repo: PaymentRepository,
}

impl ReconciliationEngine {
    pub fn new(
        customer_repo: CustomerRepository,
        invoice_repo: InvoiceRepository,
        payment_repo: PaymentRepository,
    ) -> Self {
        Self { customer_repo, invoice_repo, payment_repo }
    }

    // =========================================================================
    //  DRIVERS (loop de commit)
    // =========================================================================
    // O mesmo esqueleto para cada tipo de entidade: processa em chunks (de 1,
    // no modo por linha), cada chunk na sua transação, seguindo em frente
    // depois de falha de linha. Uma falha sistêmica no meio do chunk faz
    // rollback do chunk inteiro e marca as linhas dele como failed.

    pub async fn reconcile_party_rows(
        &self,
        pool: &PgPool,
        rows: &[PartyRow],
        source: &str,
        mode: CommitMode,
    ) -> Result<BatchOutcome, AppError> {
        let mut out = BatchOutcome { total: rows.len(), ..Default::default() };

        for chunk in rows.chunks(mode.chunk_size()) {
            let row_ids: Vec<u32> = chunk.iter().map(|r| r.row).collect();
            let mut tx = pool.begin().await?;
            let mut chunk_outcomes = Vec::with_capacity(chunk.len());
            let mut systemic: Option<AppError> = None;

            for row in chunk {
                match self.party_row_in_tx(&mut tx, row, source).await {
                    Ok(outcome) => chunk_outcomes.push(outcome),
                    Err(e) => {
                        systemic = Some(e);
                        break;
                    }
                }
            }

            match systemic {
                None => match tx.commit().await {
                    Ok(()) => chunk_outcomes.into_iter().for_each(|o| out.record(o)),
                    Err(e) => out.record_chunk_failure(&row_ids, &AppError::DatabaseError(e)),
                },
                Some(e) => {
                    tracing::error!("Falha sistêmica ao importar partes: {:?}", e);
                    let _ = tx.rollback().await;
                    out.record_chunk_failure(&row_ids, &e);
                }
            }
        }

        Ok(out)
    }

    pub async fn reconcile_ledger_rows(
        &self,
        pool: &PgPool,
        rows: &[LedgerTxnRow],
        source: &str,
        mode: CommitMode,
    ) -> Result<BatchOutcome, AppError> {
        let mut out = BatchOutcome { total: rows.len(), ..Default::default() };

        for chunk in rows.chunks(mode.chunk_size()) {
            let row_ids: Vec<u32> = chunk.iter().map(|r| r.row).collect();
            let mut tx = pool.begin().await?;
            let mut chunk_outcomes = Vec::with_capacity(chunk.len());
            let mut systemic: Option<AppError> = None;

            for row in chunk {
                match self.ledger_row_in_tx(&mut tx, row, source).await {
                    Ok(outcome) => chunk_outcomes.push(outcome),
                    Err(e) => {
                        systemic = Some(e);
                        break;
                    }
                }
            }

            match systemic {
                None => match tx.commit().await {
                    Ok(()) => chunk_outcomes.into_iter().for_each(|o| out.record(o)),
                    Err(e) => out.record_chunk_failure(&row_ids, &AppError::DatabaseError(e)),
                },
                Some(e) => {
                    tracing::error!("Falha sistêmica ao importar razão: {:?}", e);
                    let _ = tx.rollback().await;
                    out.record_chunk_failure(&row_ids, &e);
                }
            }
        }

        Ok(out)
    }

    pub async fn reconcile_invoice_rows(
        &self,
        pool: &PgPool,
        rows: &[InvoiceRow],
        source: &str,
        mode: CommitMode,
    ) -> Result<BatchOutcome, AppError> {
        let mut out = BatchOutcome { total: rows.len(), ..Default::default() };

        for chunk in rows.chunks(mode.chunk_size()) {
            let row_ids: Vec<u32> = chunk.iter().map(|r| r.row).collect();
            let mut tx = pool.begin().await?;
            let mut chunk_outcomes = Vec::with_capacity(chunk.len());
            let mut systemic: Option<AppError> = None;

            for row in chunk {
                match self.invoice_row_in_tx(&mut tx, row, source).await {
                    Ok(outcome) => chunk_outcomes.push(outcome),
                    Err(e) => {
                        systemic = Some(e);
                        break;
                    }
                }
            }

            match systemic {
                None => match tx.commit().await {
                    Ok(()) => chunk_outcomes.into_iter().for_each(|o| out.record(o)),
                    Err(e) => out.record_chunk_failure(&row_ids, &AppError::DatabaseError(e)),
                },
                Some(e) => {
                    tracing::error!("Falha sistêmica ao importar faturas: {:?}", e);
                    let _ = tx.rollback().await;
                    out.record_chunk_failure(&row_ids, &e);
                }
            }
        }

        Ok(out)
    }

    pub async fn reconcile_xml_customers(
        &self,
        pool: &PgPool,
        records: &[XmlCustomerRecord],
        mode: CommitMode,
    ) -> Result<BatchOutcome, AppError> {
        let mut out = BatchOutcome { total: records.len(), ..Default::default() };
        let indexed: Vec<(u32, &XmlCustomerRecord)> =
            records.iter().enumerate().map(|(i, r)| ((i + 1) as u32, r)).collect();

        for chunk in indexed.chunks(mode.chunk_size()) {
            let row_ids: Vec<u32> = chunk.iter().map(|(i, _)| *i).collect();
            let mut tx = pool.begin().await?;
            let mut chunk_outcomes = Vec::with_capacity(chunk.len());
            let mut systemic: Option<AppError> = None;

            for (row_no, record) in chunk {
                match self.xml_customer_in_tx(&mut tx, *row_no, record).await {
                    Ok(outcome) => chunk_outcomes.push(outcome),
                    Err(e) => {
                        systemic = Some(e);
                        break;
                    }
                }
            }

            match systemic {
                None => match tx.commit().await {
                    Ok(()) => chunk_outcomes.into_iter().for_each(|o| out.record(o)),
                    Err(e) => out.record_chunk_failure(&row_ids, &AppError::DatabaseError(e)),
                },
                Some(e) => {
                    tracing::error!("Falha sistêmica no upload de clientes XML: {:?}", e);
                    let _ = tx.rollback().await;
                    out.record_chunk_failure(&row_ids, &e);
                }
            }
        }

        Ok(out)
    }

    pub async fn reconcile_xml_bills(
        &self,
        pool: &PgPool,
        records: &[XmlBillRecord],
        mode: CommitMode,
    ) -> Result<BatchOutcome, AppError> {
        let mut out = BatchOutcome { total: records.len(), ..Default::default() };
        let indexed: Vec<(u32, &XmlBillRecord)> =
            records.iter().enumerate().map(|(i, r)| ((i + 1) as u32, r)).collect();

        for chunk in indexed.chunks(mode.chunk_size()) {
            let row_ids: Vec<u32> = chunk.iter().map(|(i, _)| *i).collect();
            let mut tx = pool.begin().await?;
            let mut chunk_outcomes = Vec::with_capacity(chunk.len());
            let mut systemic: Option<AppError> = None;

            for (row_no, record) in chunk {
                match self.xml_bill_in_tx(&mut tx, *row_no, record).await {
                    Ok(outcome) => chunk_outcomes.push(outcome),
                    Err(e) => {
                        systemic = Some(e);
                        break;
                    }
                }
            }

            match systemic {
                None => match tx.commit().await {
                    Ok(()) => chunk_outcomes.into_iter().for_each(|o| out.record(o)),
                    Err(e) => out.record_chunk_failure(&row_ids, &AppError::DatabaseError(e)),
                },
                Some(e) => {
                    tracing::error!("Falha sistêmica no upload de notas XML: {:?}", e);
                    let _ = tx.rollback().await;
                    out.record_chunk_failure(&row_ids, &e);
                }
            }
        }

        Ok(out)
    }

    pub async fn reconcile_xml_payments(
        &self,
        pool: &PgPool,
        records: &[XmlPaymentRecord],
        mode: CommitMode,
    ) -> Result<BatchOutcome, AppError> {
        let mut out = BatchOutcome { total: records.len(), ..Default::default() };
        let indexed: Vec<(u32, &XmlPaymentRecord)> =
            records.iter().enumerate().map(|(i, r)| ((i + 1) as u32, r)).collect();

        for chunk in indexed.chunks(mode.chunk_size()) {
            let row_ids: Vec<u32> = chunk.iter().map(|(i, _)| *i).collect();
            let mut tx = pool.begin().await?;
            let mut chunk_outcomes = Vec::with_capacity(chunk.len());
            let mut systemic: Option<AppError> = None;

            for (row_no, record) in chunk {
                match self.xml_payment_in_tx(&mut tx, *row_no, record).await {
                    Ok(outcome) => chunk_outcomes.push(outcome),
                    Err(e) => {
                        systemic = Some(e);
                        break;
                    }
                }
            }

            match systemic {
                None => match tx.commit().await {
                    Ok(()) => chunk_outcomes.into_iter().for_each(|o| out.record(o)),
                    Err(e) => out.record_chunk_failure(&row_ids, &AppError::DatabaseError(e)),
                },
                Some(e) => {
                    tracing::error!("Falha sistêmica no upload de recibos XML: {:?}", e);
                    let _ = tx.rollback().await;
                    out.record_chunk_failure(&row_ids, &e);
                }
            }
        }

        Ok(out)
    }

    // =========================================================================
    //  SEMÂNTICA POR ENTIDADE
    // =========================================================================

    // Clientes (planilha): lookup por nome aparado caso-insensível.
    //  - ausente: insere travado (importação autoritativa);
    //  - presente e destravado: atualização não-destrutiva + trava;
    //  - presente e travado: erro "duplicado/travado" — o operador precisa
    //    ver que a linha foi deixada de lado de propósito.
    async fn party_row_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: &PartyRow,
        source: &str,
    ) -> Result<RowOutcome, AppError> {
        let existing = self.customer_repo.find_by_name_ci(&mut **tx, &row.name).await?;

        match existing {
            None => {
                let mobile = row.mobile.as_deref().unwrap_or("0000000000");
                self.customer_repo
                    .insert_imported(
                        &mut **tx,
                        &row.name,
                        mobile,
                        row.address.as_deref(),
                        row.opening_balance,
                        row.balance_type,
                        true,
                        source,
                    )
                    .await?;
                Ok(RowOutcome::Inserted)
            }
            Some(customer) if customer.locked => Ok(RowOutcome::Skipped(Some(RowError::with_field(
                row.row,
                row.name.clone(),
                "Duplicate (locked from previous import)",
            )))),
            Some(customer) => {
                self.customer_repo
                    .update_from_import(
                        &mut **tx,
                        customer.id,
                        row.opening_balance,
                        row.balance_type,
                        row.mobile.as_deref(),
                        row.address.as_deref(),
                        source,
                    )
                    .await?;
                Ok(RowOutcome::Inserted)
            }
        }
    }

    // Razão/vendas: resolução permissiva — transação pode citar cliente que
    // não veio no arquivo de partes.
    async fn ledger_row_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: &LedgerTxnRow,
        source: &str,
    ) -> Result<RowOutcome, AppError> {
        let customer = match self.customer_repo.find_by_name_ci(&mut **tx, &row.customer_name).await? {
            Some(c) => c,
            None => {
                self.customer_repo
                    .insert_placeholder(&mut **tx, &row.customer_name, &synthetic_mobile())
                    .await?
            }
        };

        match row.kind {
            TxnKind::Sale | TxnKind::CreditNote => {
                let Some(ref_no) = row.ref_no.as_deref() else {
                    return Ok(RowOutcome::Failed(RowError::with_field(
                        row.row,
                        row.customer_name.clone(),
                        "Missing invoice/voucher number",
                    )));
                };

                if self
                    .invoice_repo
                    .find_id_by_customer_and_no(&mut **tx, customer.id, ref_no)
                    .await?
                    .is_some()
                {
                    return Ok(RowOutcome::Skipped(None));
                }

                // Nota de crédito entra como fatura de valor negativo.
                let amount = if row.kind == TxnKind::CreditNote { -row.amount } else { row.amount };

                self.invoice_repo
                    .insert(
                        &mut **tx,
                        customer.id,
                        ref_no,
                        row.date,
                        amount,
                        InvoiceStatus::Paid,
                        source,
                        true,
                    )
                    .await?;
                Ok(RowOutcome::Inserted)
            }
            TxnKind::Payment => {
                let mode = "payment";

                let duplicate = match row.ref_no.as_deref() {
                    Some(receipt) => {
                        self.payment_repo.exists_by_receipt(&mut **tx, customer.id, receipt).await?
                    }
                    None => {
                        self.payment_repo
                            .exists_by_fallback_key(&mut **tx, customer.id, row.date, row.amount, mode)
                            .await?
                    }
                };
                if duplicate {
                    return Ok(RowOutcome::Skipped(None));
                }

                let receipt_no = row
                    .ref_no
                    .clone()
                    .unwrap_or_else(generated_receipt_no);

                self.payment_repo
                    .insert(
                        &mut **tx,
                        customer.id,
                        None,
                        &receipt_no,
                        row.date,
                        row.amount,
                        mode,
                        None,
                        source,
                    )
                    .await?;
                Ok(RowOutcome::Inserted)
            }
        }
    }

    // Lista simples de faturas (fallback): mesma resolução permissiva do razão.
    async fn invoice_row_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: &InvoiceRow,
        source: &str,
    ) -> Result<RowOutcome, AppError> {
        let customer = match self.customer_repo.find_by_name_ci(&mut **tx, &row.customer_name).await? {
            Some(c) => c,
            None => {
                self.customer_repo
                    .insert_placeholder(&mut **tx, &row.customer_name, &synthetic_mobile())
                    .await?
            }
        };

        if self
            .invoice_repo
            .find_id_by_customer_and_no(&mut **tx, customer.id, &row.invoice_no)
            .await?
            .is_some()
        {
            return Ok(RowOutcome::Skipped(None));
        }

        self.invoice_repo
            .insert(
                &mut **tx,
                customer.id,
                &row.invoice_no,
                row.date,
                row.total_amount,
                InvoiceStatus::Paid,
                source,
                true,
            )
            .await?;
        Ok(RowOutcome::Inserted)
    }

    // XML clientes: duplicata por código ou (nome, celular); celular
    // implausível é falha da linha (o pipeline estrito não inventa dado).
    async fn xml_customer_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row_no: u32,
        record: &XmlCustomerRecord,
    ) -> Result<RowOutcome, AppError> {
        let existing = match record.customer_code.as_deref() {
            Some(code) => self.customer_repo.find_by_code(&mut **tx, code).await?,
            None => {
                self.customer_repo
                    .find_by_name_and_mobile(&mut **tx, &record.name, &record.mobile)
                    .await?
            }
        };
        if existing.is_some() {
            return Ok(RowOutcome::Skipped(None));
        }

        if normalize_phone(&record.mobile).is_none() {
            return Ok(RowOutcome::Failed(RowError::with_field(
                row_no,
                "mobile",
                "Invalid or missing mobile number",
            )));
        }

        self.customer_repo
            .insert_from_xml(&mut **tx, &record.name, &record.mobile, record.customer_code.as_deref())
            .await?;
        Ok(RowOutcome::Inserted)
    }

    // XML notas: resolução ESTRITA do cliente (por código, senão por nome);
    // não resolver é falha da linha, nunca auto-criação.
    async fn xml_bill_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row_no: u32,
        record: &XmlBillRecord,
    ) -> Result<RowOutcome, AppError> {
        let Some(bill_date) = parse_flexible_date(&record.bill_date) else {
            return Ok(RowOutcome::Failed(RowError::with_field(
                row_no,
                "date",
                format!("Invalid bill date: {}", record.bill_date),
            )));
        };

        if self
            .invoice_repo
            .exists_by_no_and_date(&mut **tx, &record.bill_no, bill_date)
            .await?
        {
            return Ok(RowOutcome::Skipped(None));
        }

        let customer = match (&record.customer_code, &record.customer_name) {
            (Some(code), _) => self.customer_repo.find_by_code(&mut **tx, code).await?,
            (None, Some(name)) => self.customer_repo.find_by_name_ci(&mut **tx, name).await?,
            (None, None) => None,
        };

        let Some(customer) = customer else {
            let wanted = record
                .customer_code
                .as_deref()
                .or(record.customer_name.as_deref())
                .unwrap_or("?");
            return Ok(RowOutcome::Failed(RowError::with_field(
                row_no,
                "customer",
                format!("Customer not found: {}", wanted),
            )));
        };

        let amount: Decimal = parse_amount(&record.amount);

        self.invoice_repo
            .insert(
                &mut **tx,
                customer.id,
                &record.bill_no,
                bill_date,
                amount,
                InvoiceStatus::Unpaid,
                "xml_upload",
                false,
            )
            .await?;
        Ok(RowOutcome::Inserted)
    }

    // XML recibos: a nota alvo precisa existir (estágio anterior).
    async fn xml_payment_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row_no: u32,
        record: &XmlPaymentRecord,
    ) -> Result<RowOutcome, AppError> {
        let Some(invoice) = self.invoice_repo.find_by_no(&mut **tx, &record.bill_no).await? else {
            return Ok(RowOutcome::Failed(RowError::with_field(
                row_no,
                "bill",
                format!("Bill not found: {}", record.bill_no),
            )));
        };

        if self
            .payment_repo
            .exists_for_invoice_receipt(&mut **tx, invoice.id, &record.receipt_no)
            .await?
        {
            return Ok(RowOutcome::Skipped(None));
        }

        let Some(payment_date) = parse_flexible_date(&record.payment_date) else {
            return Ok(RowOutcome::Failed(RowError::with_field(
                row_no,
                "date",
                format!("Invalid payment date: {}", record.payment_date),
            )));
        };

        let amount: Decimal = parse_amount(&record.amount);

        self.payment_repo
            .insert(
                &mut **tx,
                invoice.customer_id,
                Some(invoice.id),
                &record.receipt_no,
                payment_date,
                amount,
                &record.mode,
                None,
                "xml_upload",
            )
            .await?;
        Ok(RowOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_mobile_is_recognizable_placeholder() {
        let m = synthetic_mobile();
        assert_eq!(m.len(), 10);
        assert!(m.starts_with("00"));
    }

    #[test]
    fn commit_mode_chunk_sizes() {
        assert_eq!(CommitMode::PerRow.chunk_size(), 1);
        assert_eq!(CommitMode::Chunked(500).chunk_size(), 500);
        assert_eq!(CommitMode::Chunked(0).chunk_size(), 1);
    }

    #[test]
    fn outcome_status_reflects_batch_shape() {
        let mut ok = BatchOutcome { total: 2, ..Default::default() };
        ok.record(RowOutcome::Inserted);
        ok.record(RowOutcome::Inserted);
        assert_eq!(ok.status(), ImportStatus::Success);

        let mut mixed = BatchOutcome { total: 2, ..Default::default() };
        mixed.record(RowOutcome::Inserted);
        mixed.record(RowOutcome::Failed(RowError::new(3, "boom")));
        assert_eq!(mixed.status(), ImportStatus::Partial);

        let mut dup_only = BatchOutcome { total: 1, ..Default::default() };
        dup_only.record(RowOutcome::Skipped(None));
        assert_eq!(dup_only.status(), ImportStatus::Success);

        let mut dead = BatchOutcome { total: 1, ..Default::default() };
        dead.record(RowOutcome::Failed(RowError::new(2, "boom")));
        assert_eq!(dead.status(), ImportStatus::Failed);
    }
}
