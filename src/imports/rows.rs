// src/imports/rows.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::common::error::AppError;
use crate::imports::coerce::{excel_serial_to_date, parse_amount, parse_flexible_date, normalize_phone};
use crate::imports::headers::{resolve_headers, INVOICE_ALIASES, LEDGER_ALIASES, PARTY_ALIASES};
use crate::imports::spreadsheet::{CellValue, RawRow};
use crate::models::customer::BalanceType;
use crate::models::imports::{FileKind, RowError};

// =========================================================================
//  LINHAS TIPADAS (união por tipo de entidade)
// =========================================================================
// Depois daqui nada downstream toca em mapas: o motor de reconciliação só
// enxerga esses formatos fechados.

#[derive(Debug, Clone, PartialEq)]
pub struct PartyRow {
    // Linha do arquivo (1-based, contando o cabeçalho), para diagnóstico.
    pub row: u32,
    pub name: String,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub opening_balance: Decimal,
    pub balance_type: BalanceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    Sale,
    CreditNote,
    Payment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTxnRow {
    pub row: u32,
    pub customer_name: String,
    pub date: NaiveDate,
    pub kind: TxnKind,
    pub amount: Decimal,
    pub ref_no: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRow {
    pub row: u32,
    pub invoice_no: String,
    pub customer_name: String,
    pub date: NaiveDate,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone)]
pub enum MappedRows {
    Customers(Vec<PartyRow>),
    Ledger(Vec<LedgerTxnRow>),
    Invoices(Vec<InvoiceRow>),
}

// =========================================================================
//  HELPERS
// =========================================================================

fn get_cell<'a>(row: &'a RawRow, map: &HashMap<&'static str, String>, field: &str) -> Option<&'a CellValue> {
    map.get(field).and_then(|header| row.get(header))
}

fn get_text(row: &RawRow, map: &HashMap<&'static str, String>, field: &str) -> Option<String> {
    get_cell(row, map, field).and_then(|c| c.as_text())
}

// Data pode vir como serial do Excel ou texto livre.
fn get_date(row: &RawRow, map: &HashMap<&'static str, String>, field: &str) -> Result<Option<NaiveDate>, ()> {
    match get_cell(row, map, field) {
        None | Some(CellValue::Empty) => Ok(None),
        Some(CellValue::Number(serial)) => excel_serial_to_date(*serial).map(Some).ok_or(()),
        Some(cell) => match cell.as_text() {
            Some(text) => parse_flexible_date(&text).map(Some).ok_or(()),
            None => Ok(None),
        },
    }
}

fn get_amount(row: &RawRow, map: &HashMap<&'static str, String>, field: &str) -> Decimal {
    match get_cell(row, map, field) {
        Some(cell) => cell.as_text().map(|t| parse_amount(&t)).unwrap_or(Decimal::ZERO),
        None => Decimal::ZERO,
    }
}

// A primeira linha de dados é a linha 2 do arquivo.
fn file_row(index: usize) -> u32 {
    (index + 2) as u32
}

// =========================================================================
//  VALIDAÇÃO / MAPEAMENTO POR TIPO
// =========================================================================

/// Relatório de partes/clientes. Coluna de nome ausente é erro estrutural
/// (rejeita o lote antes de qualquer linha); todo o resto degrada por linha.
pub fn validate_party_rows(
    file_headers: &[String],
    raw: &[RawRow],
) -> Result<(Vec<PartyRow>, Vec<RowError>), AppError> {
    let map = resolve_headers(PARTY_ALIASES, file_headers);
    if !map.contains_key("name") {
        return Err(AppError::MissingRequiredColumn("Party Name"));
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, r) in raw.iter().enumerate() {
        let Some(name) = get_text(r, &map, "name") else {
            errors.push(RowError::with_field(file_row(i), "name", "Missing Party Name"));
            continue;
        };

        // Telefone implausível descarta o telefone, não a linha.
        let mobile = get_text(r, &map, "mobile").and_then(|m| normalize_phone(&m));
        let address = get_text(r, &map, "address");

        // Polaridade: coluna Dr/Cr explícita quando existe, senão o par
        // receivable/payable do export estilo Vyapar.
        let (opening_balance, balance_type) = if map.contains_key("balance_type")
            || map.contains_key("opening_balance")
        {
            let mut balance = get_amount(r, &map, "opening_balance");
            let type_str = get_text(r, &map, "balance_type").unwrap_or_default().to_lowercase();
            if type_str.contains("cr") || type_str == "c" {
                // Crédito = nós devemos; saldo negativo.
                if balance > Decimal::ZERO {
                    balance = -balance;
                }
                (balance, BalanceType::Payable)
            } else {
                (balance, BalanceType::Receivable)
            }
        } else {
            let rec = get_amount(r, &map, "receivable");
            let pay = get_amount(r, &map, "payable");
            if pay > Decimal::ZERO && pay > rec {
                (-pay, BalanceType::Payable)
            } else {
                (rec, BalanceType::Receivable)
            }
        };

        rows.push(PartyRow {
            row: file_row(i),
            name,
            mobile,
            address,
            opening_balance,
            balance_type,
        });
    }

    Ok((rows, errors))
}

/// Relatório de razão/vendas: cada linha é classificada pelo tipo de voucher.
pub fn validate_ledger_rows(
    file_headers: &[String],
    raw: &[RawRow],
) -> Result<(Vec<LedgerTxnRow>, Vec<RowError>), AppError> {
    let map = resolve_headers(LEDGER_ALIASES, file_headers);
    if !map.contains_key("customer_name") {
        return Err(AppError::MissingRequiredColumn("Party Name"));
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, r) in raw.iter().enumerate() {
        let row_no = file_row(i);

        let Some(customer_name) = get_text(r, &map, "customer_name") else {
            errors.push(RowError::with_field(row_no, "customer_name", "Missing Party Name"));
            continue;
        };

        let date = match get_date(r, &map, "date") {
            Ok(Some(d)) => d,
            Ok(None) => {
                errors.push(RowError::with_field(row_no, "date", "Missing Date"));
                continue;
            }
            Err(()) => {
                errors.push(RowError::with_field(row_no, "date", "Invalid date format"));
                continue;
            }
        };

        let type_str = get_text(r, &map, "txn_type").unwrap_or_default().to_lowercase();
        let kind = if type_str.contains("sale") || type_str.contains("invoice") {
            TxnKind::Sale
        } else if type_str.contains("payment") || type_str.contains("receipt") {
            TxnKind::Payment
        } else if type_str.contains("credit") {
            TxnKind::CreditNote
        } else {
            errors.push(RowError::with_field(
                row_no,
                "txn_type",
                format!("Unknown transaction type: {}", type_str),
            ));
            continue;
        };

        let amount = get_amount(r, &map, "amount");
        let ref_no = get_text(r, &map, "ref_no");

        rows.push(LedgerTxnRow { row: row_no, customer_name, date, kind, amount, ref_no });
    }

    Ok((rows, errors))
}

/// Lista simples de faturas (fallback): precisa do número e da parte.
/// Data ausente assume hoje, como nos exports resumidos.
pub fn validate_invoice_rows(
    file_headers: &[String],
    raw: &[RawRow],
    today: NaiveDate,
) -> Result<(Vec<InvoiceRow>, Vec<RowError>), AppError> {
    let map = resolve_headers(INVOICE_ALIASES, file_headers);
    if !map.contains_key("invoice_no") || !map.contains_key("customer_name") {
        return Err(AppError::MissingRequiredColumn("Invoice No / Party Name"));
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, r) in raw.iter().enumerate() {
        let row_no = file_row(i);

        let Some(invoice_no) = get_text(r, &map, "invoice_no") else {
            errors.push(RowError::with_field(row_no, "invoice_no", "Missing Invoice No"));
            continue;
        };
        let Some(customer_name) = get_text(r, &map, "customer_name") else {
            errors.push(RowError::with_field(row_no, "customer_name", "Missing Party Name"));
            continue;
        };

        let date = match get_date(r, &map, "date") {
            Ok(Some(d)) => d,
            Ok(None) => today,
            Err(()) => {
                errors.push(RowError::with_field(row_no, "date", "Invalid date format"));
                continue;
            }
        };

        rows.push(InvoiceRow {
            row: row_no,
            invoice_no,
            customer_name,
            date,
            total_amount: get_amount(r, &map, "total_amount"),
        });
    }

    Ok((rows, errors))
}

/// Dispatch por tipo detectado. Products é detectado mas não reconciliado
/// (catálogo fica fora deste núcleo).
pub fn validate_and_map(
    kind: FileKind,
    file_headers: &[String],
    raw: &[RawRow],
    today: NaiveDate,
) -> Result<(MappedRows, Vec<RowError>), AppError> {
    match kind {
        FileKind::Customers => {
            let (rows, errors) = validate_party_rows(file_headers, raw)?;
            Ok((MappedRows::Customers(rows), errors))
        }
        FileKind::Ledger => {
            let (rows, errors) = validate_ledger_rows(file_headers, raw)?;
            Ok((MappedRows::Ledger(rows), errors))
        }
        FileKind::Invoices => {
            let (rows, errors) = validate_invoice_rows(file_headers, raw, today)?;
            Ok((MappedRows::Invoices(rows), errors))
        }
        FileKind::Products => Err(AppError::UnrecognizedFileType),
    }
}

// =========================================================================
//  TESTES
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn party_rows_are_independent() {
        let hdrs = headers(&["Party Name", "Opening Balance", "Dr/Cr"]);
        let raw = vec![
            row(&[("Party Name", text("ABC School")), ("Opening Balance", text("500")), ("Dr/Cr", text("Dr"))]),
            // Sem nome: só esta linha cai.
            row(&[("Opening Balance", text("100"))]),
            row(&[("Party Name", text("XYZ Traders")), ("Opening Balance", text("200")), ("Dr/Cr", text("Cr"))]),
        ];

        let (rows, errors) = validate_party_rows(&hdrs, &raw).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3); // linha 3 do arquivo (cabeçalho = 1)
        assert_eq!(rows.len() + errors.len(), raw.len());
    }

    #[test]
    fn party_crdr_polarity_inverts_payable() {
        let hdrs = headers(&["Party Name", "Opening Balance", "Dr/Cr"]);
        let raw = vec![
            row(&[("Party Name", text("A")), ("Opening Balance", text("500")), ("Dr/Cr", text("Cr"))]),
            row(&[("Party Name", text("B")), ("Opening Balance", text("500")), ("Dr/Cr", text("Dr"))]),
        ];

        let (rows, _) = validate_party_rows(&hdrs, &raw).unwrap();
        assert_eq!(rows[0].balance_type, BalanceType::Payable);
        assert_eq!(rows[0].opening_balance, Decimal::from(-500));
        assert_eq!(rows[1].balance_type, BalanceType::Receivable);
        assert_eq!(rows[1].opening_balance, Decimal::from(500));
    }

    #[test]
    fn party_receivable_payable_columns() {
        let hdrs = headers(&["Name", "Receivable Balance", "Payable Balance"]);
        let raw = vec![
            row(&[("Name", text("A")), ("Receivable Balance", text("300"))]),
            row(&[("Name", text("B")), ("Payable Balance", text("800"))]),
        ];

        let (rows, _) = validate_party_rows(&hdrs, &raw).unwrap();
        assert_eq!(rows[0].opening_balance, Decimal::from(300));
        assert_eq!(rows[0].balance_type, BalanceType::Receivable);
        assert_eq!(rows[1].opening_balance, Decimal::from(-800));
        assert_eq!(rows[1].balance_type, BalanceType::Payable);
    }

    #[test]
    fn bad_phone_drops_phone_not_row() {
        let hdrs = headers(&["Party Name", "Mobile"]);
        let raw = vec![row(&[("Party Name", text("A")), ("Mobile", text("12345"))])];

        let (rows, errors) = validate_party_rows(&hdrs, &raw).unwrap();
        assert!(errors.is_empty());
        assert_eq!(rows[0].mobile, None);
    }

    #[test]
    fn missing_name_column_is_structural() {
        let hdrs = headers(&["Mobile", "Opening Balance"]);
        let err = validate_party_rows(&hdrs, &[]).unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredColumn(_)));
    }

    #[test]
    fn ledger_classifies_voucher_types() {
        let hdrs = headers(&["Party Name", "Voucher Type", "Date", "Amount", "Voucher No"]);
        let raw = vec![
            row(&[("Party Name", text("A")), ("Voucher Type", text("Sales Invoice")), ("Date", text("2024-04-01")), ("Amount", text("5000")), ("Voucher No", text("INV-100"))]),
            row(&[("Party Name", text("A")), ("Voucher Type", text("Receipt")), ("Date", text("2024-04-10")), ("Amount", text("3000"))]),
            row(&[("Party Name", text("A")), ("Voucher Type", text("Credit Note")), ("Date", text("2024-04-12")), ("Amount", text("500")), ("Voucher No", text("CN-1"))]),
            row(&[("Party Name", text("A")), ("Voucher Type", text("Journal")), ("Date", text("2024-04-13")), ("Amount", text("1"))]),
        ];

        let (rows, errors) = validate_ledger_rows(&hdrs, &raw).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, TxnKind::Sale);
        assert_eq!(rows[1].kind, TxnKind::Payment);
        assert_eq!(rows[2].kind, TxnKind::CreditNote);
        // Tipo desconhecido é erro de linha, não descarte silencioso.
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 5);
    }

    #[test]
    fn ledger_accepts_excel_serial_dates() {
        let hdrs = headers(&["Party Name", "Voucher Type", "Date", "Amount"]);
        let raw = vec![row(&[
            ("Party Name", text("A")),
            ("Voucher Type", text("Sale")),
            ("Date", CellValue::Number(45383.0)), // 2024-04-01
            ("Amount", text("10")),
        ])];

        let (rows, errors) = validate_ledger_rows(&hdrs, &raw).unwrap();
        assert!(errors.is_empty());
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn ledger_missing_date_fails_that_row_only() {
        let hdrs = headers(&["Party Name", "Voucher Type", "Date", "Amount"]);
        let raw = vec![
            row(&[("Party Name", text("A")), ("Voucher Type", text("Sale")), ("Amount", text("10"))]),
            row(&[("Party Name", text("B")), ("Voucher Type", text("Sale")), ("Date", text("2024-04-02")), ("Amount", text("20"))]),
        ];

        let (rows, errors) = validate_ledger_rows(&hdrs, &raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 2);
    }

    #[test]
    fn invoice_rows_default_missing_date_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let hdrs = headers(&["Bill No", "Party Name", "Total"]);
        let raw = vec![row(&[("Bill No", text("77")), ("Party Name", text("A")), ("Total", text("₹1,000"))])];

        let (rows, errors) = validate_invoice_rows(&hdrs, &raw, today).unwrap();
        assert!(errors.is_empty());
        assert_eq!(rows[0].date, today);
        assert_eq!(rows[0].invoice_no, "77");
        assert_eq!(rows[0].total_amount, Decimal::from(1000));
    }
}
