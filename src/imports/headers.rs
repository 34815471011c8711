// src/imports/headers.rs

use std::collections::HashMap;

// Campo canônico -> apelidos aceitos, em ordem de prioridade. Os exports
// dessas ferramentas mudam o rótulo das colunas a cada versão; a comparação
// é sempre sobre a forma normalizada.

pub const PARTY_ALIASES: &[(&str, &[&str])] = &[
    ("name", &["Party Name", "Name", "Customer Name"]),
    ("opening_balance", &["Opening Balance", "Balance", "Amount", "Closing Balance"]),
    ("balance_type", &["Dr/Cr", "Type", "Balance Type", "Dr / Cr"]),
    ("receivable", &["Receivable Balance", "Receivable"]),
    ("payable", &["Payable Balance", "Payable"]),
    ("mobile", &["Mobile", "Phone", "Contact No", "Mobile No", "Phone Number", "Phone No", "Phone No."]),
    ("address", &["Address", "Billing Address"]),
];

pub const LEDGER_ALIASES: &[(&str, &[&str])] = &[
    ("customer_name", &["Party Name", "Particulars", "Customer Name", "Name"]),
    ("txn_type", &["Transaction Type", "Voucher Type", "Type"]),
    ("date", &["Date", "Bill Date", "Voucher Date"]),
    ("amount", &["Total Amount", "Amount", "Debit", "Credit"]),
    ("ref_no", &["Invoice No", "Voucher No", "Ref No"]),
];

pub const INVOICE_ALIASES: &[(&str, &[&str])] = &[
    ("invoice_no", &["Invoice No", "Invoice No.", "Bill No", "Bill Number", "Voucher No", "Ref No"]),
    ("customer_name", &["Party Name", "Customer Name"]),
    ("date", &["Date", "Invoice Date", "Bill Date"]),
    ("total_amount", &["Amount", "Total Amount", "Invoice Amount", "Net Amount", "Grand Total", "Total"]),
];

/// Normaliza um cabeçalho para comparação: minúsculas, só alfanumérico.
/// "Phone No." == "phone no" == "PhoneNo".
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Resolve o mapa `campo canônico -> cabeçalho real do arquivo`.
/// O primeiro apelido (em ordem de prioridade) cuja forma normalizada bate
/// com um cabeçalho real ganha; campo sem apelido presente fica de fora.
pub fn resolve_headers(
    aliases: &[(&'static str, &[&str])],
    file_headers: &[String],
) -> HashMap<&'static str, String> {
    let normalized: Vec<(String, &String)> = file_headers
        .iter()
        .map(|h| (normalize_header(h), h))
        .collect();

    let mut map = HashMap::new();
    for (target, names) in aliases {
        for name in *names {
            let wanted = normalize_header(name);
            if let Some((_, original)) = normalized.iter().find(|(n, _)| *n == wanted) {
                map.insert(*target, (*original).clone());
                break;
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_case_space_and_punctuation_insensitive() {
        assert_eq!(normalize_header("Phone No."), "phoneno");
        assert_eq!(normalize_header("  phone no "), "phoneno");
        assert_eq!(normalize_header("PhoneNo"), "phoneno");
        assert_eq!(normalize_header("Dr / Cr"), "drcr");
        assert_eq!(normalize_header("Opening Balance"), "openingbalance");
    }

    #[test]
    fn resolve_picks_first_matching_alias() {
        let headers = vec!["PARTY NAME".to_string(), "Closing Balance".to_string()];
        let map = resolve_headers(PARTY_ALIASES, &headers);
        assert_eq!(map.get("name").map(String::as_str), Some("PARTY NAME"));
        // "Opening Balance" não está no arquivo; o apelido de menor
        // prioridade "Closing Balance" resolve o mesmo campo.
        assert_eq!(map.get("opening_balance").map(String::as_str), Some("Closing Balance"));
    }

    #[test]
    fn resolve_omits_fields_without_match() {
        let headers = vec!["Party Name".to_string()];
        let map = resolve_headers(PARTY_ALIASES, &headers);
        assert!(map.contains_key("name"));
        assert!(!map.contains_key("mobile"));
        assert!(!map.contains_key("balance_type"));
    }

    #[test]
    fn resolve_honors_priority_order() {
        // "Invoice No" e "Bill No" presentes: o primeiro apelido ganha.
        let headers = vec!["Bill No".to_string(), "Invoice No".to_string()];
        let map = resolve_headers(INVOICE_ALIASES, &headers);
        assert_eq!(map.get("invoice_no").map(String::as_str), Some("Invoice No"));
    }
}
