// src/services/balance.rs
//
// A álgebra do saldo, pura e idêntica à da customer_ledger_view:
//
//   abertura(janela) = saldo base + SUM(debit - credit) antes do início
//   compras/pagos    = SUM(debit) / SUM(credit) dentro da janela
//   fechamento       = abertura + compras - pagos
//
// Não existe saldo armazenado em lugar nenhum — qualquer caminho que quiser
// um saldo passa por essas somas (no SQL para agregados, aqui para o saldo
// corrente linha a linha da exibição).

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::ledger::{LedgerDisplayRow, LedgerEntry, LedgerSummary};

pub fn closing_balance(opening: Decimal, purchase: Decimal, paid: Decimal) -> Decimal {
    opening + purchase - paid
}

/// Saldo corrente por linha, andando as entradas em ordem cronológica.
/// Quem exibe inverte a lista para "mais recente primeiro".
pub fn running_rows(opening: Decimal, entries: &[LedgerEntry]) -> Vec<LedgerDisplayRow> {
    let mut balance = opening;
    entries
        .iter()
        .map(|e| {
            balance += e.debit - e.credit;
            LedgerDisplayRow {
                id: e.source_id,
                entry_type: e.entry_type.clone(),
                entry_date: e.entry_date,
                reference_no: e.description.clone(),
                debit: e.debit,
                credit: e.credit,
                balance,
                created_at: e.created_at,
            }
        })
        .collect()
}

// Espelhos puros das somas que o LedgerRepository faz em SQL. Existem para
// fixar a álgebra em teste (identidade de fechamento, composição de janelas
// adjacentes) sem precisar de banco.

pub fn sum_strictly_before(entries: &[LedgerEntry], start: NaiveDate) -> Decimal {
    entries
        .iter()
        .filter(|e| e.entry_date < start)
        .map(|e| e.debit - e.credit)
        .sum()
}

pub fn window_totals(
    entries: &[LedgerEntry],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (Decimal, Decimal) {
    let in_window = |e: &&LedgerEntry| {
        start.is_none_or(|s| e.entry_date >= s) && end.is_none_or(|x| e.entry_date <= x)
    };
    let purchase = entries.iter().filter(in_window).map(|e| e.debit).sum();
    let paid = entries.iter().filter(in_window).map(|e| e.credit).sum();
    (purchase, paid)
}

pub fn summarize(
    base_opening: Decimal,
    entries: &[LedgerEntry],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> LedgerSummary {
    let opening = match start {
        Some(s) => base_opening + sum_strictly_before(entries, s),
        None => base_opening,
    };
    let (purchase, paid) = window_totals(entries, start, end);
    LedgerSummary {
        opening_balance: opening,
        total_purchases: purchase,
        total_paid: paid,
        current_balance: closing_balance(opening, purchase, paid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(date: NaiveDate, debit: i64, credit: i64) -> LedgerEntry {
        LedgerEntry {
            source_id: Uuid::new_v4(),
            entry_type: if debit > 0 { "invoice".into() } else { "payment".into() },
            customer_id: Uuid::nil(),
            entry_date: date,
            debit: Decimal::from(debit),
            credit: Decimal::from(credit),
            description: "X".into(),
            created_at: None,
        }
    }

    // Cenário do caderno: abertura 0, fatura 5000 em 01/04, pagamento 3000
    // em 10/04 — abril fecha em 2000.
    #[test]
    fn april_scenario() {
        let entries = vec![
            entry(d(2024, 4, 1), 5000, 0),
            entry(d(2024, 4, 10), 0, 3000),
        ];
        let summary = summarize(
            Decimal::ZERO,
            &entries,
            Some(d(2024, 4, 1)),
            Some(d(2024, 4, 30)),
        );
        assert_eq!(summary.opening_balance, Decimal::ZERO);
        assert_eq!(summary.total_purchases, Decimal::from(5000));
        assert_eq!(summary.total_paid, Decimal::from(3000));
        assert_eq!(summary.current_balance, Decimal::from(2000));
    }

    #[test]
    fn closing_identity_holds() {
        let entries = vec![
            entry(d(2024, 3, 15), 1000, 0),
            entry(d(2024, 4, 1), 5000, 0),
            entry(d(2024, 4, 10), 0, 3000),
            entry(d(2024, 5, 2), 0, 500),
        ];
        let s = summarize(Decimal::from(200), &entries, Some(d(2024, 4, 1)), Some(d(2024, 4, 30)));
        assert_eq!(
            s.current_balance,
            s.opening_balance + s.total_purchases - s.total_paid
        );
        // A entrada de março entra na abertura, a de maio em lugar nenhum.
        assert_eq!(s.opening_balance, Decimal::from(1200));
    }

    #[test]
    fn adjacent_windows_compose() {
        let entries = vec![
            entry(d(2024, 4, 1), 5000, 0),
            entry(d(2024, 4, 10), 0, 3000),
            entry(d(2024, 5, 3), 2000, 0),
            entry(d(2024, 5, 20), 0, 1000),
        ];
        let base = Decimal::from(100);

        let april = summarize(base, &entries, Some(d(2024, 4, 1)), Some(d(2024, 4, 30)));
        let may = summarize(base, &entries, Some(d(2024, 5, 1)), Some(d(2024, 5, 31)));

        // A abertura da janela seguinte é o fechamento da anterior.
        assert_eq!(may.opening_balance, april.current_balance);
    }

    #[test]
    fn no_entries_in_range_collapses_to_base() {
        let summary = summarize(
            Decimal::from(750),
            &[],
            Some(d(2024, 4, 1)),
            Some(d(2024, 4, 30)),
        );
        assert_eq!(summary.opening_balance, Decimal::from(750));
        assert_eq!(summary.total_purchases, Decimal::ZERO);
        assert_eq!(summary.total_paid, Decimal::ZERO);
        assert_eq!(summary.current_balance, Decimal::from(750));
    }

    #[test]
    fn unbounded_window_sums_everything() {
        let entries = vec![entry(d(2024, 1, 1), 100, 0), entry(d(2024, 6, 1), 0, 40)];
        let s = summarize(Decimal::ZERO, &entries, None, None);
        assert_eq!(s.opening_balance, Decimal::ZERO);
        assert_eq!(s.current_balance, Decimal::from(60));
    }

    #[test]
    fn running_rows_walk_chronologically() {
        let entries = vec![
            entry(d(2024, 4, 1), 5000, 0),
            entry(d(2024, 4, 10), 0, 3000),
            entry(d(2024, 4, 15), 1000, 0),
        ];
        let rows = running_rows(Decimal::from(500), &entries);
        let balances: Vec<Decimal> = rows.iter().map(|r| r.balance).collect();
        assert_eq!(
            balances,
            vec![Decimal::from(5500), Decimal::from(2500), Decimal::from(3500)]
        );
    }
}
