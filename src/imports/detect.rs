// src/imports/detect.rs

use crate::imports::headers::normalize_header;
use crate::models::imports::FileKind;

/// Classifica o arquivo pelos cabeçalhos, em ordem de prioridade.
///
/// A ordem importa: um export de vendas/razão é a forma mais rica e
/// específica — ele também costuma ter uma coluna de número de fatura, e sem
/// prioridade seria classificado errado como lista simples de faturas.
pub fn detect_file_type(headers: &[String]) -> Option<FileKind> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let any = |pred: &dyn Fn(&str) -> bool| normalized.iter().any(|h| pred(h));

    // 1. Razão / relatório de vendas: coluna de tipo de transação/voucher.
    if any(&|h| h.contains("transactiontype") || h.contains("vouchertype")) {
        return Some(FileKind::Ledger);
    }

    // 2. Relatório de clientes/partes: colunas de saldo.
    if any(&|h| h.contains("receivable") || h.contains("payablebalance") || h.contains("openingbalance")) {
        return Some(FileKind::Customers);
    }

    // 3. Produtos: nome de item + estoque ou preço (em colunas distintas).
    if any(&|h| h.contains("itemname"))
        && any(&|h| h.contains("stock") || h.contains("price"))
    {
        return Some(FileKind::Products);
    }

    // 4. Lista simples de faturas (fallback).
    if any(&|h| h.contains("invoiceno") || h.contains("billno")) {
        return Some(FileKind::Invoices);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ledger_wins_over_invoice_number_column() {
        // Um relatório de vendas também tem "Invoice No"; o tipo de voucher
        // tem que ganhar.
        let kind = detect_file_type(&h(&["Date", "Party Name", "Voucher Type", "Invoice No", "Amount"]));
        assert_eq!(kind, Some(FileKind::Ledger));
    }

    #[test]
    fn balance_columns_classify_as_customers() {
        let kind = detect_file_type(&h(&["Name", "Receivable Balance", "Mobile"]));
        assert_eq!(kind, Some(FileKind::Customers));

        let kind = detect_file_type(&h(&["Party Name", "Opening Balance", "Dr/Cr"]));
        assert_eq!(kind, Some(FileKind::Customers));
    }

    #[test]
    fn item_plus_stock_or_price_classifies_as_products() {
        let kind = detect_file_type(&h(&["Item Name", "Current Stock", "Sales Price"]));
        assert_eq!(kind, Some(FileKind::Products));

        // Só o nome do item, sem estoque/preço, não basta.
        assert_eq!(detect_file_type(&h(&["Item Name", "HSN Code"])), None);
    }

    #[test]
    fn invoice_number_is_the_fallback() {
        let kind = detect_file_type(&h(&["Bill No", "Date", "Total"]));
        assert_eq!(kind, Some(FileKind::Invoices));
    }

    #[test]
    fn unrecognized_headers_return_none() {
        assert_eq!(detect_file_type(&h(&["Foo", "Bar"])), None);
        assert_eq!(detect_file_type(&[]), None);
    }
}
