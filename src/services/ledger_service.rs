// src/services/ledger_service.rs
//
// Monta o dashboard do cliente a partir da view derivada. Abertura e totais
// vêm de SUM() na view; o saldo corrente linha a linha vem da caminhada
// cronológica em balance::running_rows.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, InvoiceRepository, LedgerRepository, PaymentRepository},
    models::ledger::{DashboardResponse, LedgerSummary, PaginationInfo, PeriodInfo},
    services::balance,
};

const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct DashboardQuery {
    // 'monthly' | 'yearly' | 'all' (default)
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

// Resolve a janela de datas. Datas explícitas vencem o period; 'all' (ou
// nada) significa sem filtro.
fn resolve_period(query: &DashboardQuery, today: NaiveDate) -> (String, Option<NaiveDate>, Option<NaiveDate>) {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        return ("custom".to_string(), Some(start), Some(end));
    }

    match query.period.as_deref() {
        Some("monthly") => {
            let start = today.with_day(1);
            let end = start
                .and_then(|s| {
                    if s.month() == 12 {
                        NaiveDate::from_ymd_opt(s.year() + 1, 1, 1)
                    } else {
                        NaiveDate::from_ymd_opt(s.year(), s.month() + 1, 1)
                    }
                })
                .map(|next| next.pred_opt().unwrap_or(today));
            ("monthly".to_string(), start, end)
        }
        Some("yearly") => {
            // Ano fiscal indiano: 1º de abril a 31 de março.
            let start_year = if today.month() < 4 { today.year() - 1 } else { today.year() };
            let start = NaiveDate::from_ymd_opt(start_year, 4, 1);
            let end = NaiveDate::from_ymd_opt(start_year + 1, 3, 31);
            ("yearly".to_string(), start, end)
        }
        _ => ("all".to_string(), None, None),
    }
}

#[derive(Clone)]
pub struct LedgerService {
    customer_repo: CustomerRepository,
    invoice_repo: InvoiceRepository,
    payment_repo: PaymentRepository,
    ledger_repo: LedgerRepository,
}

impl LedgerService {
    pub fn new(
        customer_repo: CustomerRepository,
        invoice_repo: InvoiceRepository,
        payment_repo: PaymentRepository,
        ledger_repo: LedgerRepository,
    ) -> Self {
        Self { customer_repo, invoice_repo, payment_repo, ledger_repo }
    }

    pub async fn dashboard(
        &self,
        pool: &PgPool,
        customer_id: Uuid,
        query: DashboardQuery,
    ) -> Result<DashboardResponse, AppError> {
        let today = Utc::now().date_naive();
        let (period_type, start_date, end_date) = resolve_period(&query, today);

        // Paginação opcional, com teto.
        let page = query.page.map(|p| p.max(1));
        let page_size = query.page_size.map(|s| s.clamp(1, MAX_PAGE_SIZE));
        let (limit, offset) = match (page, page_size) {
            (Some(p), Some(s)) => (Some(s), Some((p - 1) * s)),
            _ => (None, None),
        };

        // 1. Cliente
        let customer = self
            .customer_repo
            .find_by_id(pool, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        // 2. Abertura = saldo base + variação anterior ao início da janela.
        let mut opening = customer.opening_balance;
        if let Some(start) = start_date {
            opening += self.ledger_repo.sum_before(pool, customer_id, start).await?;
        }

        // 3. Totais do período.
        let (purchase, paid) = self
            .ledger_repo
            .period_totals(pool, customer_id, start_date, end_date)
            .await?;

        // 4. Fechamento.
        let closing: Decimal = balance::closing_balance(opening, purchase, paid);

        // 5. Extrato com saldo corrente, invertido para o mais recente primeiro.
        let entries = self
            .ledger_repo
            .list_entries(pool, customer_id, start_date, end_date)
            .await?;
        let mut ledger = balance::running_rows(opening, &entries);
        ledger.reverse();

        // 6. Faturas com pago/devido e pagamentos, para as abas dedicadas.
        let invoices = self
            .invoice_repo
            .list_with_settlement(pool, customer_id, start_date, end_date, limit, offset)
            .await?;

        let pagination = match (page, page_size) {
            (Some(p), Some(s)) => {
                let total = self
                    .invoice_repo
                    .count_for_customer(pool, customer_id, start_date, end_date)
                    .await?;
                Some(PaginationInfo {
                    page: p,
                    page_size: s,
                    total,
                    total_pages: (total + s - 1) / s,
                })
            }
            _ => None,
        };

        let payments = self
            .payment_repo
            .list_for_customer(pool, customer_id, start_date, end_date, limit, offset)
            .await?;

        // 7. Agregados mensais para os gráficos.
        let monthly = self
            .ledger_repo
            .monthly_stats(pool, customer_id, start_date, end_date)
            .await?;

        Ok(DashboardResponse {
            customer,
            ledger,
            invoices,
            payments,
            summary: LedgerSummary {
                opening_balance: opening,
                total_purchases: purchase,
                total_paid: paid,
                current_balance: closing,
            },
            monthly,
            period: PeriodInfo { period_type, start_date, end_date },
            pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn explicit_dates_override_period() {
        let query = DashboardQuery {
            period: Some("monthly".to_string()),
            start_date: Some(d(2024, 4, 1)),
            end_date: Some(d(2024, 4, 30)),
            ..Default::default()
        };
        let (kind, start, end) = resolve_period(&query, d(2024, 7, 15));
        assert_eq!(kind, "custom");
        assert_eq!(start, Some(d(2024, 4, 1)));
        assert_eq!(end, Some(d(2024, 4, 30)));
    }

    #[test]
    fn monthly_covers_the_current_month() {
        let query = DashboardQuery { period: Some("monthly".to_string()), ..Default::default() };
        let (_, start, end) = resolve_period(&query, d(2024, 2, 10));
        assert_eq!(start, Some(d(2024, 2, 1)));
        assert_eq!(end, Some(d(2024, 2, 29)));

        let (_, start, end) = resolve_period(&query, d(2024, 12, 5));
        assert_eq!(start, Some(d(2024, 12, 1)));
        assert_eq!(end, Some(d(2024, 12, 31)));
    }

    #[test]
    fn yearly_is_the_indian_fiscal_year() {
        let query = DashboardQuery { period: Some("yearly".to_string()), ..Default::default() };

        // Depois de abril: AF corrente.
        let (_, start, end) = resolve_period(&query, d(2024, 7, 1));
        assert_eq!(start, Some(d(2024, 4, 1)));
        assert_eq!(end, Some(d(2025, 3, 31)));

        // Antes de abril: AF anterior.
        let (_, start, end) = resolve_period(&query, d(2024, 2, 1));
        assert_eq!(start, Some(d(2023, 4, 1)));
        assert_eq!(end, Some(d(2024, 3, 31)));
    }

    #[test]
    fn all_means_no_window() {
        let (kind, start, end) = resolve_period(&DashboardQuery::default(), d(2024, 7, 15));
        assert_eq!(kind, "all");
        assert_eq!(start, None);
        assert_eq!(end, None);
    }
}
